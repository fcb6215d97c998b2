//! Askama template definitions.

use askama::Template;
use plog_core::{Heading, NavEntry};
use serde::Serialize;

/// Component document wrapping one rendered markdown file.
///
/// The template section shows the optional sidebar container, the title,
/// the document body and the content table. The script section exposes the
/// heading list and sidebar configuration to the consuming framework.
#[derive(Template)]
#[template(path = "document.vue", escape = "html")]
pub struct DocumentTemplate {
    pub title: String,
    /// Processed HTML body, emitted verbatim
    pub body: String,
    pub has_navigation: bool,
    pub headings_json: String,
    pub navigation_json: String,
}

impl DocumentTemplate {
    pub fn new(
        title: &str,
        body: String,
        headings: &[Heading],
        navigation: Option<&NavEntry>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            title: title.to_string(),
            body,
            has_navigation: navigation.is_some(),
            headings_json: script_json(&headings)?,
            navigation_json: script_json(&navigation)?,
        })
    }
}

/// JSON that is safe to inline inside a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn render(template: DocumentTemplate) -> String {
        template.render().unwrap()
    }

    #[test]
    fn test_without_navigation() {
        let out = render(DocumentTemplate::new("test title", String::new(), &[], None).unwrap());
        let re = Regex::new(
            r#"(?s)^<template>.*<DocContentTable :headings="headings"></DocContentTable>.*</template>\s*<script setup lang="ts">.*</script>\s*$"#,
        )
        .unwrap();
        assert!(re.is_match(&out), "{}", out);
        assert!(!out.contains("DocSideBarContainer"));
        assert!(out.contains("const headings = [];"));
        assert!(out.contains("const sideBarConfig = null;"));
    }

    #[test]
    fn test_with_navigation_and_headings() {
        let headings = vec![Heading {
            title: "Heading 1".into(),
            slug: "heading-1".into(),
            tag: "h1".into(),
        }];
        let nav = NavEntry::Leaf {
            text: "doc".into(),
            link: "doc".into(),
        };
        let body = "<h1>Heading 1</h1><h2>Heading 2</h2>".to_string();
        let out = render(DocumentTemplate::new("test title", body, &headings, Some(&nav)).unwrap());

        let re = Regex::new(
            r#"(?s)^<template>.*<DocSideBarContainer :config="sideBarConfig" ></DocSideBarContainer>.*<h1 class="plog-doc-title">test title</h1>.*<h1>Heading 1</h1><h2>Heading 2</h2>.*<DocContentTable :headings="headings"></DocContentTable>.*</template>\s*<script setup lang="ts">.*</script>\s*$"#,
        )
        .unwrap();
        assert!(re.is_match(&out), "{}", out);
        assert!(out.contains(r#"const headings = [{"title":"Heading 1","slug":"heading-1","tag":"h1"}];"#));
        assert!(out.contains(r#"const sideBarConfig = {"text":"doc","link":"doc"};"#));
    }

    #[test]
    fn test_title_is_escaped() {
        let out = render(DocumentTemplate::new("a <b> & c", String::new(), &[], None).unwrap());
        assert!(out.contains(r#"<h1 class="plog-doc-title">a &#60;b&#62; &#38; c</h1>"#)
            || out.contains(r#"<h1 class="plog-doc-title">a &lt;b&gt; &amp; c</h1>"#));
    }

    #[test]
    fn test_script_json_cannot_close_script() {
        let headings = vec![Heading {
            title: "</script>".into(),
            slug: "script".into(),
            tag: "h2".into(),
        }];
        let out = render(DocumentTemplate::new("t", String::new(), &headings, None).unwrap());
        assert_eq!(out.matches("</script>").count(), 1);
        assert!(out.contains(r#""title":"<\/script>""#));
    }
}
