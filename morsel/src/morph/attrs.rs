use super::Morpher;
use crate::{DomError, LocalName, NodeId, Stem};

#[allow(unused_imports)]
use crate::tracing_macros::trace;

impl Morpher<'_> {
    /// Set attributes of `next` that differ on `old`, remove the ones `next`
    /// lacks. Untouched attributes produce no mutation.
    pub(crate) fn morph_attributes(&mut self, old: NodeId, next: NodeId) -> Result<(), DomError> {
        let (Some(old_elem), Some(next_elem)) =
            (self.dom.element_data(old), self.dom.element_data(next))
        else {
            return Err(DomError::NotAnElement);
        };

        let set: Vec<(LocalName, Stem)> = next_elem
            .attrs
            .iter()
            .filter(|(name, value)| old_elem.attrs.get(*name) != Some(*value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let removed: Vec<LocalName> = old_elem
            .attrs
            .keys()
            .filter(|name| !next_elem.attrs.contains_key(*name))
            .cloned()
            .collect();

        for name in removed {
            trace!(?old, %name, "remove attribute");
            self.dom.remove_attribute(old, &name)?;
        }
        for (name, value) in set {
            trace!(?old, %name, "set attribute");
            self.dom.set_attribute(old, &name, &value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Dom, Mutation};
    use facet_testhelpers::test;

    #[test]
    fn test_only_changed_attributes_are_touched() {
        let mut dom = Dom::parse_document(
            r#"<html><body><div id="a" class="x" title="gone"></div></body></html>"#,
        );
        let body = dom.body().unwrap();
        let next = dom
            .element("div")
            .attr("id", "a")
            .attr("class", "y")
            .attr("lang", "en")
            .build()
            .unwrap();

        dom.observe();
        dom.morph(body, next).unwrap();
        let records = dom.take_records();

        let names: Vec<(bool, &str)> = records
            .iter()
            .filter_map(|m| match m {
                Mutation::SetAttribute { name, .. } => Some((true, &**name)),
                Mutation::RemoveAttribute { name, .. } => Some((false, &**name)),
                _ => None,
            })
            .collect();
        assert_eq!(names, [(false, "title"), (true, "class"), (true, "lang")]);
        assert_eq!(records.len(), 3);
        assert_eq!(
            dom.to_html(),
            r#"<div id="a" class="y" lang="en"></div>"#
        );
    }
}
