use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => render_table(value),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn table_options() -> table::TableOptions {
    let prefs = ui::prefs();
    table::TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

fn render_table<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let options = table_options();
    let value = serde_json::to_value(value)?;
    match value {
        Value::Array(items) => Ok(render_array_table(&items, options)),
        Value::Object(map) => {
            let headers = ["key", "value"];
            let mut entries = map.into_iter().collect::<Vec<_>>();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let rows = entries
                .into_iter()
                .map(|(key, value)| vec![key, value_to_cell(&value)])
                .collect::<Vec<_>>();
            Ok(table::render_entity_table(&headers, &rows, options))
        }
        scalar => Ok(table::render_entity_table(
            &["value"],
            &[vec![value_to_cell(&scalar)]],
            options,
        )),
    }
}

fn render_array_table(items: &[Value], options: table::TableOptions) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }

    if !items.iter().all(Value::is_object) {
        let rows = items
            .iter()
            .map(|item| vec![value_to_cell(item)])
            .collect::<Vec<_>>();
        return table::render_entity_table(&["value"], &rows, options);
    }

    // Union of keys across rows, in first-seen order.
    let mut headers = Vec::<String>::new();
    for map in items.iter().filter_map(Value::as_object) {
        for key in map.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    if headers.is_empty() {
        return String::from("(no columns)");
    }

    let header_refs = headers.iter().map(String::as_str).collect::<Vec<_>>();
    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|header| map.get(header).map_or_else(|| String::from("-"), value_to_cell))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    table::render_entity_table(&header_refs, &rows, options)
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| String::from("<invalid-json>")),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::Serialize;

    use super::{render, table::TableOptions, table::render_entity_table};
    use crate::cli::OutputFormat;

    #[derive(Serialize)]
    struct Membership {
        id: &'static str,
        name: &'static str,
        role_label: Option<&'static str>,
    }

    #[test]
    fn json_render_is_valid_json() {
        let value = Membership {
            id: "org-1",
            name: "Org One",
            role_label: Some("Org Admin"),
        };
        let out = render(&value, OutputFormat::Json).expect("json render should work");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json should parse");
        assert_eq!(parsed["id"], "org-1");
        assert_eq!(parsed["role_label"], "Org Admin");
    }

    #[test]
    fn raw_render_is_single_line_json() {
        let value = Membership {
            id: "org-1",
            name: "Org One",
            role_label: None,
        };
        let out = render(&value, OutputFormat::Raw).expect("raw render should work");
        assert!(!out.contains('\n'));
        assert!(out.contains("\"role_label\":null"));
    }

    #[test]
    fn table_render_of_list_keeps_field_order() {
        let rows = vec![
            Membership {
                id: "org-1",
                name: "Org One",
                role_label: Some("Org Admin"),
            },
            Membership {
                id: "org-2",
                name: "Org Two",
                role_label: None,
            },
        ];
        let out = render(&rows, OutputFormat::Table).expect("table render should work");
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        let header: Vec<&str> = lines[0].split_whitespace().collect();
        assert_eq!(header, vec!["id", "name", "role_label"]);
        assert!(lines[3].trim_end().ends_with('-'));
    }

    #[test]
    fn empty_list_renders_placeholder() {
        let rows: Vec<Membership> = Vec::new();
        let out = render(&rows, OutputFormat::Table).expect("table render should work");
        assert_eq!(out, "(no rows)");
    }

    #[test]
    fn narrow_terminal_truncates_long_cells() {
        let rows = vec![vec![
            "org-1".to_string(),
            "An organization with a very long display name".to_string(),
        ]];
        let out = render_entity_table(
            &["id", "name"],
            &rows,
            TableOptions {
                max_width: Some(40),
                color: false,
            },
        );

        assert!(out.lines().all(|line| line.chars().count() <= 40), "{out}");
        assert!(out.contains('…'));
    }
}
