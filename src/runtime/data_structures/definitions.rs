use crate::runtime::error::{self, ErrorKind, ScriptError};
use std::{
    fmt::{self, Display, Formatter},
    fs::{read_to_string, write},
};

/// The most user words, or macros, that can be defined at once.
pub const MAX_DEFINITIONS: usize = 64;

/// Longer names are truncated, with a diagnostic when typed at the repl.
pub const MAX_NAME_LENGTH: usize = 15;

/// Longer bodies are truncated.
pub const MAX_BODY_LENGTH: usize = 1023;

/// A named piece of calculator source.  When the name is evaluated the body is evaluated in its
/// place.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Definition {
    pub name: String,
    pub body: String,
}

impl Definition {
    /// Create a definition, truncating an overly long name or body.
    pub fn new(name: &str, body: &str) -> Definition {
        Definition {
            name: truncate(name, MAX_NAME_LENGTH),
            body: truncate(body.trim(), MAX_BODY_LENGTH),
        }
    }

    /// Cut the name down to `MAX_NAME_LENGTH`.  Returns true if anything was cut.
    pub fn shorten_name(&mut self) -> bool {
        if self.name.chars().count() <= MAX_NAME_LENGTH {
            return false;
        }

        self.name = truncate(&self.name, MAX_NAME_LENGTH);
        true
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// An ordered list of definitions.  Used both for the user's words and for the predefined macros.
///
/// Names don't have to be unique.  A new definition with an existing name is appended and lookup
/// always returns the oldest one, so redefining a name has no effect until the older entry is
/// deleted.
#[derive(Clone, Default, Debug)]
pub struct DefinitionList {
    entries: Vec<Definition>,
}

/// Listing in the `listwords` format, one numbered definition per line.
impl Display for DefinitionList {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for (index, definition) in self.entries.iter().enumerate() {
            writeln!(f, "{:2}. {:>16}: {}", index, definition.name, definition.body)?;
        }

        Ok(())
    }
}

impl DefinitionList {
    pub fn new() -> DefinitionList {
        DefinitionList {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Definition> {
        self.entries.iter()
    }

    /// Get a definition by its position in the list.
    pub fn get(&self, index: usize) -> Option<&Definition> {
        self.entries.get(index)
    }

    /// Find the oldest definition with the given name.
    pub fn find(&self, name: &str) -> Option<&Definition> {
        self.entries.iter().find(|definition| definition.name == name)
    }

    /// Append a definition and return its index.
    pub fn add(&mut self, definition: Definition) -> error::Result<usize> {
        if self.entries.len() >= MAX_DEFINITIONS {
            return ScriptError::bare(
                ErrorKind::InvalidArgument,
                &format!("Too many definitions, the limit is {}.", MAX_DEFINITIONS),
            );
        }

        self.entries.push(definition);
        Ok(self.entries.len() - 1)
    }

    /// Remove the definition at the index, later definitions move up one place.
    pub fn remove(&mut self, index: usize) -> error::Result<Definition> {
        if index >= self.entries.len() {
            return ScriptError::bare(
                ErrorKind::InvalidArgument,
                &format!("Invalid definition number {}.", index),
            );
        }

        Ok(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Read definitions from text with one `name body` pair per line.  Lines without a body are
    /// skipped, as are any definitions past the maximum count.
    pub fn parse(text: &str) -> DefinitionList {
        let mut list = DefinitionList::new();

        for line in text.lines() {
            let line = line.trim();

            if let Some((name, body)) = line.split_once(char::is_whitespace)
                && !body.trim().is_empty()
                && list.entries.len() < MAX_DEFINITIONS
            {
                list.entries.push(Definition::new(name, body));
            }
        }

        list
    }

    /// Load a definition file, replacing the current contents.
    pub fn load_from_file(&mut self, path: &str) -> error::Result<()> {
        let text = read_to_string(path).map_err(|error| {
            ScriptError::new(
                ErrorKind::Io,
                None,
                format!("Could not read definitions from {}: {}", path, error),
                None,
            )
        })?;

        *self = DefinitionList::parse(&text);
        Ok(())
    }

    /// Save every definition to a file as `name body` lines.
    pub fn save_to_file(&self, path: &str) -> error::Result<()> {
        let mut text = String::new();

        for definition in self.entries.iter() {
            text.push_str(&definition.name);
            text.push(' ');
            text.push_str(&definition.body);
            text.push('\n');
        }

        write(path, text)?;
        Ok(())
    }
}

/// Recognize a word definition line, `: name body ;`.  The name is alphanumeric or `_` and must be
/// followed by whitespace.  The body is everything up to the final `;`, trimmed.  The name is kept
/// as typed, see `Definition::shorten_name`.
pub fn parse_definition(line: &str) -> Option<Definition> {
    let rest = line.trim().strip_prefix(':')?.trim_start();

    let name_length = rest
        .find(|next: char| !(next.is_ascii_alphanumeric() || next == '_'))
        .unwrap_or(rest.len());

    if name_length == 0 {
        return None;
    }

    let (name, rest) = rest.split_at(name_length);

    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let body = rest.trim().strip_suffix(';')?;

    Some(Definition {
        name: name.to_string(),
        body: truncate(body.trim(), MAX_BODY_LENGTH),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_line_is_recognized() {
        let definition = parse_definition(" : sq  dup *  ; ").unwrap();

        assert_eq!(definition.name, "sq");
        assert_eq!(definition.body, "dup *");
    }

    #[test]
    fn definition_needs_space_after_name() {
        assert!(parse_definition(":sq;").is_none());
        assert!(parse_definition(": sq dup *").is_none());
        assert!(parse_definition("3 4 +").is_none());
    }

    #[test]
    fn oldest_definition_wins() {
        let mut list = DefinitionList::new();

        list.add(Definition::new("f", "1")).unwrap();
        list.add(Definition::new("f", "2")).unwrap();

        assert_eq!(list.find("f").unwrap().body, "1");

        list.remove(0).unwrap();
        assert_eq!(list.find("f").unwrap().body, "2");
    }

    #[test]
    fn long_names_are_truncated() {
        let definition = Definition::new("abcdefghijklmnopqrstuvwxyz", "1");
        assert_eq!(definition.name.len(), MAX_NAME_LENGTH);
    }

    #[test]
    fn typed_names_are_shortened_on_request() {
        let mut definition = parse_definition(": averyveryverylongname 1 ;").unwrap();
        assert_eq!(definition.name, "averyveryverylongname");

        assert!(definition.shorten_name());
        assert_eq!(definition.name, "averyveryverylo");
        assert!(!definition.shorten_name());
    }

    #[test]
    fn parse_skips_lines_without_body() {
        let list = DefinitionList::parse("sq dup *\nlonely\n\ncube dup dup * *\n");

        assert_eq!(list.len(), 2);
        assert_eq!(list.get(1).unwrap().body, "dup dup * *");
    }
}
