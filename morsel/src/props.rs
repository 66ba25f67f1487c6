//! Live-only element state that attributes cannot express.
//!
//! Two families:
//!
//! - [`DomProp`]: the small fixed set of form properties whose live value
//!   drifts away from the attribute that initialized it (`value`, `checked`,
//!   `selected`, `indeterminate`).
//! - [`LiveValue`]: arbitrary non-primitive values (objects, lists,
//!   callbacks) assigned as properties. The producer mirrors each assignment
//!   in the node's [`PropRecord`] so the differ knows which ones it owns.

use crate::dom::ElementData;
use crate::{Dom, DomError, Mutation, NodeId, Stem};
use facet::Facet;
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A form property whose live value is not reflected by its attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Facet)]
#[repr(u8)]
pub enum DomProp {
    Value,
    Checked,
    Selected,
    Indeterminate,
}

impl DomProp {
    /// Every property the DOM-property differ synchronizes, in patch order.
    pub const ALL: [DomProp; 4] = [
        DomProp::Value,
        DomProp::Checked,
        DomProp::Selected,
        DomProp::Indeterminate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DomProp::Value => "value",
            DomProp::Checked => "checked",
            DomProp::Selected => "selected",
            DomProp::Indeterminate => "indeterminate",
        }
    }

    /// Whether elements with this tag carry the property at all.
    pub fn applies_to(self, tag: &str) -> bool {
        match self {
            DomProp::Value => matches!(tag, "input" | "textarea" | "select" | "option" | "button"),
            DomProp::Checked | DomProp::Indeterminate => tag == "input",
            DomProp::Selected => tag == "option",
        }
    }
}

/// The value of a [`DomProp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomPropValue {
    Text(Stem),
    Flag(bool),
}

impl DomPropValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DomPropValue::Text(text) => Some(text),
            DomPropValue::Flag(_) => None,
        }
    }

    /// Flags as-is; text is true unless empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            DomPropValue::Flag(flag) => *flag,
            DomPropValue::Text(text) => !text.is_empty(),
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            DomPropValue::Flag(flag) => Some(*flag),
            DomPropValue::Text(_) => None,
        }
    }
}

impl From<bool> for DomPropValue {
    fn from(flag: bool) -> Self {
        DomPropValue::Flag(flag)
    }
}

impl From<&str> for DomPropValue {
    fn from(text: &str) -> Self {
        DomPropValue::Text(text.into())
    }
}

/// A non-primitive value assigned as a live property.
///
/// Compared by identity, the way a reference-typed property would be.
#[derive(Clone)]
pub struct LiveValue(Rc<dyn Any>);

impl LiveValue {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &LiveValue) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for LiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LiveValue({:p})", Rc::as_ptr(&self.0))
    }
}

/// Properties assigned by the producer, by name, with the value assigned.
#[derive(Clone, Debug, Default)]
pub struct PropRecord(IndexMap<Stem, LiveValue>);

impl PropRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&LiveValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: Stem, value: LiveValue) -> Option<LiveValue> {
        self.0.insert(name, value)
    }

    pub fn remove(&mut self, name: &str) -> Option<LiveValue> {
        self.0.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Stem, &LiveValue)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &Stem> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Dom {
    /// The effective value of a form property.
    ///
    /// A property that was never written reflects its attribute (or, for
    /// `<textarea>`, its text content). Returns `None` if the element does
    /// not carry the property.
    pub fn dom_prop(&self, node: NodeId, prop: DomProp) -> Option<DomPropValue> {
        let elem = self.element_data(node)?;
        if !prop.applies_to(&elem.tag) {
            return None;
        }
        let live = &elem.live;
        let value = match prop {
            DomProp::Value => DomPropValue::Text(match &live.value {
                Some(value) => value.clone(),
                None => self.default_value(node, elem),
            }),
            DomProp::Checked => {
                DomPropValue::Flag(live.checked.unwrap_or_else(|| elem.attr("checked").is_some()))
            }
            DomProp::Selected => DomPropValue::Flag(
                live.selected
                    .unwrap_or_else(|| elem.attr("selected").is_some()),
            ),
            DomProp::Indeterminate => DomPropValue::Flag(live.indeterminate),
        };
        Some(value)
    }

    fn default_value(&self, node: NodeId, elem: &ElementData) -> Stem {
        match &*elem.tag {
            "textarea" => Stem::from(self.text_content(node)),
            "option" => match elem.attr("value") {
                Some(value) => value.clone(),
                None => Stem::from(self.text_content(node)),
            },
            "select" => {
                let options: Vec<NodeId> = node
                    .descendants(&self.arena)
                    .filter(|&id| self.tag(id).is_some_and(|t| &**t == "option"))
                    .collect();
                let chosen = options
                    .iter()
                    .copied()
                    .find(|&id| {
                        self.dom_prop(id, DomProp::Selected)
                            .and_then(|v| v.as_flag())
                            .unwrap_or(false)
                    })
                    .or_else(|| options.first().copied());
                chosen
                    .and_then(|id| self.dom_prop(id, DomProp::Value))
                    .and_then(|v| v.as_text().map(Stem::from))
                    .unwrap_or_default()
            }
            _ => elem.attr("value").cloned().unwrap_or_default(),
        }
    }

    /// Write a form property's live value.
    pub fn set_dom_prop(
        &mut self,
        node: NodeId,
        prop: DomProp,
        value: impl Into<DomPropValue>,
    ) -> Result<(), DomError> {
        let value = value.into();
        let elem = self.element_mut(node)?;
        let live = &mut elem.live;
        match (prop, value) {
            (DomProp::Value, DomPropValue::Text(text)) => live.value = Some(text),
            (DomProp::Value, DomPropValue::Flag(flag)) => {
                live.value = Some(Stem::from(if flag { "true" } else { "false" }))
            }
            (DomProp::Checked, value) => live.checked = Some(value.is_truthy()),
            (DomProp::Selected, value) => live.selected = Some(value.is_truthy()),
            (DomProp::Indeterminate, value) => live.indeterminate = value.is_truthy(),
        }
        self.record(|| Mutation::SetDomProp { node, prop });
        Ok(())
    }

    /// A live property, whether or not the producer's record owns it.
    pub fn property(&self, node: NodeId, name: &str) -> Option<&LiveValue> {
        self.element_data(node)?.properties.get(name)
    }

    pub fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: LiveValue,
    ) -> Result<(), DomError> {
        self.element_mut(node)?
            .properties
            .insert(Stem::from(name), value);
        self.record(|| Mutation::SetProperty {
            node,
            name: Stem::from(name),
        });
        Ok(())
    }

    pub fn remove_property(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        if self
            .element_mut(node)?
            .properties
            .shift_remove(name)
            .is_some()
        {
            self.record(|| Mutation::RemoveProperty {
                node,
                name: Stem::from(name),
            });
        }
        Ok(())
    }

    /// Assign a property the way a producer does: record it, then set it.
    pub fn assign_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: LiveValue,
    ) -> Result<(), DomError> {
        self.element_mut(node)?
            .props
            .insert(Stem::from(name), value.clone());
        self.set_property(node, name, value)
    }

    pub fn prop_record(&self, node: NodeId) -> Option<&PropRecord> {
        self.element_data(node).map(|elem| &elem.props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applies_to() {
        assert!(DomProp::Value.applies_to("input"));
        assert!(DomProp::Value.applies_to("textarea"));
        assert!(!DomProp::Value.applies_to("div"));
        assert!(DomProp::Checked.applies_to("input"));
        assert!(!DomProp::Checked.applies_to("option"));
        assert!(DomProp::Selected.applies_to("option"));
        assert!(DomProp::Indeterminate.applies_to("input"));
    }

    #[test]
    fn test_live_value_identity() {
        let rows = LiveValue::new(vec![1, 2, 3]);
        let same_content = LiveValue::new(vec![1, 2, 3]);
        assert!(rows.ptr_eq(&rows.clone()));
        assert!(!rows.ptr_eq(&same_content));
        assert_eq!(rows.downcast_ref::<Vec<i32>>(), Some(&vec![1, 2, 3]));
        assert_eq!(rows.downcast_ref::<String>(), None);
    }
}
