//! Generated measure narrative

use octofhir_measure_model::{Measure, Narrative, NarrativeError, NarrativeProvider};
use std::fmt::Write;

/// Minimal XHTML summary: title, scoring and improvement notation
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryNarrative;

impl NarrativeProvider for SummaryNarrative {
    fn narrative(&self, measure: &Measure) -> Result<Narrative, NarrativeError> {
        let title = measure
            .title
            .as_deref()
            .or(measure.name.as_deref())
            .or(measure.id.as_deref())
            .ok_or_else(|| NarrativeError("measure has no title, name or id".into()))?;

        let mut div = String::from(r#"<div xmlns="http://www.w3.org/1999/xhtml">"#);
        write_element(&mut div, "h2", title);
        if let Some(scoring) = measure.scoring.as_ref().and_then(|s| s.first_code()) {
            write_element(&mut div, "p", &format!("Scoring: {}", scoring));
        }
        if let Some(notation) = measure
            .improvement_notation
            .as_ref()
            .and_then(|n| n.first_code())
        {
            write_element(&mut div, "p", &format!("Improvement notation: {}", notation));
        }
        for library in &measure.library {
            write_element(&mut div, "p", &format!("Library: {}", library));
        }
        div.push_str("</div>");

        Ok(Narrative::generated(div))
    }
}

fn write_element(out: &mut String, tag: &str, text: &str) {
    let _ = write!(out, "<{tag}>{}</{tag}>", escape(text));
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
