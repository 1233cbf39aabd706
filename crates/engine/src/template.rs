use crate::config::SyncSettings;
use model::{partition::Partition, slice::WindowSlice};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unclosed `{{{{` in template `{0}`")]
    Unclosed(String),

    #[error("Empty placeholder in template `{0}`")]
    EmptyPlaceholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    /// Dotted lookup path into the interpolation context.
    Placeholder(Vec<String>),
}

/// A `{{ path }}` string template, parsed once at config time and rendered
/// once per slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    parts: Vec<Part>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut parts = Vec::new();
        let mut rest = source;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                parts.push(Part::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 2..];
            let close = after
                .find("}}")
                .ok_or_else(|| TemplateError::Unclosed(source.to_string()))?;
            let path = after[..close].trim();
            if path.is_empty() {
                return Err(TemplateError::EmptyPlaceholder(source.to_string()));
            }
            parts.push(Part::Placeholder(
                path.split('.').map(str::to_string).collect(),
            ));
            rest = &after[close + 2..];
        }
        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            parts,
        })
    }

    /// Renders against a context. Unknown paths render as empty strings so
    /// a misspelled variable degrades one field, not the whole sync.
    pub fn render(&self, context: &Value) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Placeholder(path) => match lookup(context, path) {
                    Some(value) => out.push_str(&value_text(value)),
                    None => {
                        warn!(
                            template = %self.source,
                            path = %path.join("."),
                            "template variable not found, rendering empty"
                        );
                    }
                },
            }
        }
        out
    }
}

/// A computed field stamped onto every record of a slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedField {
    pub name: String,
    pub template: Template,
}

impl AddedField {
    pub fn parse(name: &str, value: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            name: name.to_string(),
            template: Template::parse(value)?,
        })
    }
}

/// Interpolation context for one slice: `config.*`, `partition.*` and
/// `slice.*` scopes. Built once per slice and reused for every chunk and
/// record in it.
pub fn slice_context(
    settings: &SyncSettings,
    partition: &Partition,
    slice: &WindowSlice,
) -> Value {
    json!({
        "config": {
            "account_id": settings.account_id,
            "pivot": settings.pivot,
            "time_granularity": settings.time_granularity,
            "start_date": settings.start_date.format("%Y-%m-%d").to_string(),
        },
        "partition": partition.as_context(),
        "slice": {
            "start_date": slice.window.start.format("%Y-%m-%d").to_string(),
            "end_date": slice.window.end.format("%Y-%m-%d").to_string(),
        },
    })
}

fn lookup<'a>(context: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = context;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_literals_verbatim() {
        let template = Template::parse("no placeholders here").unwrap();
        assert_eq!(template.render(&json!({})), "no placeholders here");
    }

    #[test]
    fn resolves_dotted_paths() {
        let template = Template::parse(
            "urn:li:sponsoredCampaign:{{ partition.campaign_id }}",
        )
        .unwrap();
        let context = json!({"partition": {"campaign_id": 123}});
        assert_eq!(template.render(&context), "urn:li:sponsoredCampaign:123");
    }

    #[test]
    fn unknown_paths_render_empty() {
        let template = Template::parse("x={{ partition.missing }}!").unwrap();
        assert_eq!(template.render(&json!({"partition": {}})), "x=!");
    }

    #[test]
    fn multiple_placeholders_in_one_template() {
        let template =
            Template::parse("{{ slice.start_date }}/{{ slice.end_date }}").unwrap();
        let context = json!({"slice": {"start_date": "2023-01-01", "end_date": "2023-01-31"}});
        assert_eq!(template.render(&context), "2023-01-01/2023-01-31");
    }

    #[test]
    fn unclosed_placeholder_is_rejected() {
        assert_eq!(
            Template::parse("{{ partition.campaign_id"),
            Err(TemplateError::Unclosed("{{ partition.campaign_id".into()))
        );
    }

    #[test]
    fn empty_placeholder_is_rejected() {
        assert_eq!(
            Template::parse("{{  }}"),
            Err(TemplateError::EmptyPlaceholder("{{  }}".into()))
        );
    }
}
