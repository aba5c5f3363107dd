use crate::error::{ChefCtlError, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Field names the agent always expects in its client.rb.
pub const KNOWN_FIELDS: [&str; 13] = [
    "log_level",
    "log_location",
    "cache_path",
    "client_key",
    "node_name",
    "chef_server_url",
    "encrypted_data_bag_secret",
    "validation_client_name",
    "validation_key",
    "interval",
    "json_attribs",
    "ssl_verify_mode",
    "environment",
];

const DEFAULT_ENVIRONMENT: &str = "_default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Merge fields into the existing file, keeping unrecognized lines.
    Append,
    /// Delete the existing file and write from scratch.
    Overwrite,
}

/// In-memory view of a client.rb configuration file.
///
/// `fields` holds the known defaults plus whatever was read from disk;
/// `additional` holds caller-supplied extras that are merged in at save
/// time and win over same-named fields. Unrecognized lines (comments,
/// arbitrary ruby) are not modeled here: append-mode saves re-read the
/// file and carry them through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientRb {
    fields: BTreeMap<String, String>,
    additional: BTreeMap<String, String>,
}

impl ClientRb {
    /// Document containing only the known defaults.
    pub fn defaults() -> Self {
        let mut fields = BTreeMap::new();
        for name in KNOWN_FIELDS {
            fields.insert(name.to_string(), String::new());
        }
        fields.insert("environment".to_string(), DEFAULT_ENVIRONMENT.to_string());
        ClientRb {
            fields,
            additional: BTreeMap::new(),
        }
    }

    /// Load a document from `path`, starting from the known defaults.
    ///
    /// An absent or nonexistent path yields the defaults alone. Malformed
    /// lines warn and are still tokenized best-effort; the last occurrence
    /// of a field name wins, including over a default.
    pub fn load(path: Option<&Path>) -> Result<ClientRb> {
        let mut doc = Self::defaults();
        let Some(path) = path else { return Ok(doc) };
        if !path.exists() {
            return Ok(doc);
        }

        let contents = std::fs::read_to_string(path)?;
        for (idx, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            if !looks_like_setting(line) {
                eprintln!(
                    "Warning: {}:{}: unrecognized config line, parsing as name + value: {}",
                    path.display(),
                    idx + 1,
                    line
                );
            }
            let mut tokens = line.split([' ', '\t']).filter(|t| !t.is_empty());
            let Some(name) = tokens.next() else { continue };
            let value = tokens.collect::<Vec<_>>().join(" ");
            doc.fields
                .insert(name.to_string(), strip_quotes(&value).to_string());
        }
        Ok(doc)
    }

    /// Persist the document to `path`.
    ///
    /// Refuses to touch an existing file unless a mode was chosen. Append
    /// merges into the existing lines (unrecognized lines ride along
    /// untouched); Overwrite deletes the file first. Fields resolving to
    /// an empty value are treated as unset and produce no line.
    pub fn save(&self, path: &Path, mode: Option<SaveMode>) -> Result<()> {
        if path.exists() {
            match mode {
                None => return Err(ChefCtlError::ConfigExists(path.to_path_buf())),
                Some(SaveMode::Overwrite) => std::fs::remove_file(path)?,
                Some(SaveMode::Append) => {}
            }
        }

        let mut lines: Vec<String> = if path.exists() {
            std::fs::read_to_string(path)?
                .lines()
                .map(str::to_string)
                .collect()
        } else {
            Vec::new()
        };

        for (name, value) in self.resolved_fields() {
            if value.is_empty() {
                continue;
            }
            let rendered = format!("{}    {}", name, render_value(&value));

            // Upsert by leading token: replace matching lines in place,
            // append if the field is not in the file yet.
            let mut replaced = false;
            for line in lines.iter_mut() {
                if leading_token(line) == Some(name.as_str()) {
                    *line = rendered.clone();
                    replaced = true;
                }
            }
            if !replaced {
                lines.push(rendered);
            }
        }

        let mut out = lines.join("\n");
        out.push('\n');
        std::fs::write(path, out)?;
        Ok(())
    }

    /// Fields merged with additional fields; additional entries win.
    pub fn resolved_fields(&self) -> BTreeMap<String, String> {
        let mut merged = self.fields.clone();
        for (name, value) in &self.additional {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_string(), value.to_string());
    }

    /// Record an extra field that overrides `fields` at save time.
    pub fn set_additional(&mut self, name: &str, value: &str) {
        self.additional.insert(name.to_string(), value.to_string());
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn additional_is_empty(&self) -> bool {
        self.additional.is_empty()
    }
}

/// Shape check for a plausible `name value` setting line. Failing this
/// only produces a warning; the line is tokenized regardless.
fn looks_like_setting(line: &str) -> bool {
    let mut tokens = line.split([' ', '\t']).filter(|t| !t.is_empty());
    let Some(name) = tokens.next() else {
        return false;
    };
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return false;
    }
    let Some(value) = tokens.next() else {
        return false;
    };
    matches!(
        value.chars().next(),
        Some('\'' | '"' | ':' | '=') | Some('0'..='9')
    )
}

/// Strip one leading and one trailing quote character, independently.
fn strip_quotes(value: &str) -> &str {
    let value = value
        .strip_prefix('\'')
        .or_else(|| value.strip_prefix('"'))
        .unwrap_or(value);
    value
        .strip_suffix('\'')
        .or_else(|| value.strip_suffix('"'))
        .unwrap_or(value)
}

/// Quote a value for client.rb unless it reads as a ruby symbol (`:`),
/// a number, or an expression (`=`).
fn render_value(value: &str) -> String {
    let numeric = value.chars().all(|c| c.is_ascii_digit() || c == '.');
    if value.starts_with(':') || value.starts_with('=') || numeric {
        value.to_string()
    } else {
        format!("'{}'", value)
    }
}

/// First whitespace-delimited token of a line, provided whitespace
/// follows it. Lines without a separator never match an upsert.
fn leading_token(line: &str) -> Option<&str> {
    let idx = line.find([' ', '\t'])?;
    if idx == 0 {
        return None;
    }
    Some(&line[..idx])
}
