//! `<style>` sheet matching against the element tree.

use super::node::{ElementKind, NodeId, Tree};

/// Rules gathered from every `<style>` element, ordered by ascending
/// specificity with source order preserved between equal specificities.
pub(crate) struct StyleRules<'a> {
    rules: Vec<simplecss::Rule<'a>>,
}

impl<'a> StyleRules<'a> {
    pub fn collect(sources: &'a [String]) -> Self {
        let mut sheet = simplecss::StyleSheet::new();
        for source in sources {
            sheet.parse_more(source);
        }

        let mut rules = sheet.rules;
        rules.sort_by_cached_key(|rule| rule.selector.specificity());
        log::debug!(target: "layout", "collected {} style rules", rules.len());
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Declarations that apply to `node`, lowest priority first.
    pub fn matching(&self, tree: &Tree, node: NodeId) -> Vec<(&'a str, &'a str)> {
        let element = CssElement { tree, node };
        let mut out = Vec::new();
        for rule in &self.rules {
            if rule.selector.matches(&element) {
                out.extend(rule.declarations.iter().map(|d| (d.name, d.value)));
            }
        }
        out
    }
}

/// Text of every `<style>` element whose type is CSS.
pub(crate) fn style_sources(tree: &Tree) -> Vec<String> {
    tree.elements()
        .filter(|id| tree.kind(*id) == Some(&ElementKind::Style))
        .filter(|id| {
            matches!(
                tree.attribute(*id, "type").map(str::trim),
                None | Some("") | Some("text/css")
            )
        })
        .map(|id| tree.text_content(id))
        .filter(|text| !text.trim().is_empty())
        .collect()
}

/// Declarations from an inline `style` attribute.
pub(crate) fn inline_declarations(style: &str) -> Vec<(&str, &str)> {
    simplecss::DeclarationTokenizer::from(style)
        .map(|d| (d.name, d.value))
        .collect()
}

#[derive(Clone, Copy)]
struct CssElement<'t> {
    tree: &'t Tree,
    node: NodeId,
}

impl simplecss::Element for CssElement<'_> {
    fn parent_element(&self) -> Option<Self> {
        let parent = self.tree.parent(self.node)?;
        Some(CssElement {
            tree: self.tree,
            node: parent,
        })
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let parent = self.tree.parent(self.node)?;
        let mut previous = None;
        for sibling in self.tree.child_elements(parent) {
            if sibling == self.node {
                break;
            }
            previous = Some(sibling);
        }
        previous.map(|node| CssElement {
            tree: self.tree,
            node,
        })
    }

    fn has_local_name(&self, name: &str) -> bool {
        self.tree.kind(self.node).map(|k| k.name()) == Some(name)
    }

    fn attribute_matches(&self, local_name: &str, operator: simplecss::AttributeOperator) -> bool {
        match self.tree.attribute(self.node, local_name) {
            Some(value) => operator.matches(value),
            None => false,
        }
    }

    fn pseudo_class_matches(&self, class: simplecss::PseudoClass) -> bool {
        match class {
            simplecss::PseudoClass::FirstChild => self.prev_sibling_element().is_none(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_match_by_specificity() {
        let tree = Tree::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg">
                <style>
                    #hero { fill: green }
                    rect { fill: red; stroke: blue }
                    .box { fill: orange }
                </style>
                <rect id="hero" class="box" width="1" height="1"/>
                <circle class="box" r="1"/>
            </svg>"#,
        )
        .unwrap();

        let sources = style_sources(&tree);
        let rules = StyleRules::collect(&sources);
        assert!(!rules.is_empty());

        let rect = tree.element_by_id("hero").unwrap();
        let fills: Vec<&str> = rules
            .matching(&tree, rect)
            .into_iter()
            .filter(|(name, _)| *name == "fill")
            .map(|(_, value)| value)
            .collect();
        // type < class < id
        assert_eq!(fills, vec!["red", "orange", "green"]);

        let circle = tree
            .elements()
            .find(|id| tree.kind(*id).map(|k| k.name()) == Some("circle"))
            .unwrap();
        assert_eq!(rules.matching(&tree, circle), vec![("fill", "orange")]);
    }

    #[test]
    fn test_inline_declarations() {
        assert_eq!(
            inline_declarations("fill: red; stroke-width:2"),
            vec![("fill", "red"), ("stroke-width", "2")]
        );
    }
}
