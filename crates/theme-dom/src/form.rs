//! Form serialization.

use crate::document::{Document, NodeId};

impl Document {
    /// Successful form controls of `form` as `(name, value)` pairs, in
    /// document order. Controls outside the form that name it through a
    /// `form="<id>"` attribute are included after the form's own controls.
    pub fn form_entries(&self, form: NodeId) -> Vec<(String, String)> {
        let mut controls = self.descendants(form);
        if let Some(form_id) = self.id_of(form) {
            controls.extend(
                self.descendants(self.root())
                    .into_iter()
                    .filter(|n| !self.contains(form, *n) && self.attr(*n, "form") == Some(form_id)),
            );
        }

        let mut entries = Vec::new();
        for control in controls {
            self.collect_control(control, &mut entries);
        }
        entries
    }

    fn collect_control(&self, node: NodeId, entries: &mut Vec<(String, String)>) {
        let Some(el) = self.element(node) else {
            return;
        };
        let Some(name) = el.attr("name").filter(|n| !n.is_empty()) else {
            return;
        };
        if el.attr("disabled").is_some() {
            return;
        }

        match el.name.as_str() {
            "input" => {
                let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
                match kind.as_str() {
                    "checkbox" | "radio" => {
                        if el.attr("checked").is_some() {
                            entries.push((name.to_string(), el.attr("value").unwrap_or("on").to_string()));
                        }
                    }
                    "submit" | "button" | "reset" | "image" | "file" => {}
                    _ => entries.push((name.to_string(), el.attr("value").unwrap_or("").to_string())),
                }
            }
            "select" => {
                let options: Vec<NodeId> = self
                    .descendants(node)
                    .into_iter()
                    .filter(|n| self.tag(*n) == Some("option"))
                    .collect();
                let mut selected: Vec<NodeId> = options
                    .iter()
                    .copied()
                    .filter(|o| self.has_attr(*o, "selected"))
                    .collect();
                if selected.is_empty() && el.attr("multiple").is_none() {
                    selected.extend(options.first().copied());
                }
                for option in selected {
                    entries.push((name.to_string(), self.option_value(option)));
                }
            }
            "textarea" => entries.push((name.to_string(), self.text_content(node))),
            _ => {}
        }
    }

    /// Value of an `<option>`: its `value` attribute or its text.
    pub fn option_value(&self, option: NodeId) -> String {
        self.attr(option, "value")
            .map(String::from)
            .unwrap_or_else(|| self.text_content(option).trim().to_string())
    }

    /// Current value of a form control (`select`, `input` or `textarea`).
    pub fn control_value(&self, control: NodeId) -> Option<String> {
        let mut entries = Vec::new();
        self.collect_control(control, &mut entries);
        entries.into_iter().next().map(|(_, v)| v)
    }

    /// Check or uncheck a checkbox / radio input.
    pub fn set_checked(&mut self, input: NodeId, checked: bool) {
        if checked {
            self.set_attr(input, "checked", "");
        } else {
            self.remove_attr(input, "checked");
        }
    }

    /// Select the option of `select` whose value is `value`.
    pub fn select_option(&mut self, select: NodeId, value: &str) {
        let options: Vec<NodeId> = self
            .descendants(select)
            .into_iter()
            .filter(|n| self.tag(*n) == Some("option"))
            .collect();
        for option in options {
            if self.option_value(option) == value {
                self.set_attr(option, "selected", "");
            } else {
                self.remove_attr(option, "selected");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_entries() {
        let doc = Document::parse(
            r#"<form id="f">
                <input type="checkbox" name="filter.v.option.color" value="Red" checked>
                <input type="checkbox" name="filter.v.option.color" value="Blue">
                <input type="text" name="filter.v.price.gte" value="">
                <input type="text" name="q" value="shirt" disabled>
                <select name="sort_by"><option value="manual">Featured</option><option value="price-ascending" selected>Price</option></select>
                <button type="submit" name="go">Go</button>
            </form>
            <input type="hidden" name="outside" value="1" form="f">"#,
        );
        let form = doc.get_element_by_id("f").unwrap();
        assert_eq!(
            doc.form_entries(form),
            vec![
                ("filter.v.option.color".to_string(), "Red".to_string()),
                ("filter.v.price.gte".to_string(), String::new()),
                ("sort_by".to_string(), "price-ascending".to_string()),
                ("outside".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_select_option() {
        let mut doc = Document::parse(
            r#"<select id="s" name="sort_by"><option value="a" selected>A</option><option value="b">B</option></select>"#,
        );
        let s = doc.get_element_by_id("s").unwrap();
        doc.select_option(s, "b");
        assert_eq!(doc.control_value(s).as_deref(), Some("b"));
    }
}
