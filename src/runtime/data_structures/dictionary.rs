use crate::lang::source_buffer::SourceLocation;
use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

/// The information stored in the built-in function table for each function.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct WordInfo {
    /// The location in the Rust source where the function was registered.
    pub location: SourceLocation,

    /// The name of the function.
    pub name: String,

    /// A simple description of the function.
    pub description: String,

    /// The stack signature of the function.
    pub signature: String,

    /// The index of the actual handler for the function in the interpreter's handler list.
    pub handler_index: usize,
}

impl WordInfo {
    /// Create a new WordInfo with default values.
    pub fn new(location: SourceLocation) -> WordInfo {
        WordInfo {
            location,
            name: String::new(),
            description: String::new(),
            signature: String::new(),
            handler_index: 0,
        }
    }
}

/// The built-in function table used by the evaluator.  Lookup is by exact name.
///
/// The table remembers registration order.  Registering a name a second time is ignored, so the
/// first registration always wins and the dispatch order is the registration order.
#[derive(Default)]
pub struct Dictionary {
    words: HashMap<String, WordInfo>,
    order: Vec<String>,
}

/// Pretty print the table, one function per line in registration order.
impl Display for Dictionary {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        let max_name = self.order.iter().map(|name| name.len()).max().unwrap_or(0);
        let max_signature = self
            .words
            .values()
            .map(|word| word.signature.len())
            .max()
            .unwrap_or(0);

        writeln!(formatter, "{} functions defined.\n", self.order.len())?;

        for name in self.order.iter() {
            if let Some(word) = self.words.get(name) {
                writeln!(
                    formatter,
                    "{:name_width$}  {:signature_width$}  --  {}",
                    name,
                    word.signature,
                    word.description,
                    name_width = max_name,
                    signature_width = max_signature
                )?;
            }
        }

        Ok(())
    }
}

impl Dictionary {
    /// Create a new empty table.
    pub fn new() -> Dictionary {
        Dictionary {
            words: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Insert a new function and it's info.  Returns false, leaving the table untouched, if the
    /// name was already registered.
    pub fn insert(&mut self, name: String, info: WordInfo) -> bool {
        if self.words.contains_key(&name) {
            return false;
        }

        self.order.push(name.clone());
        let _ = self.words.insert(name, info);

        true
    }

    /// Try to get a function from the table.
    pub fn try_get(&self, name: &str) -> Option<&WordInfo> {
        self.words.get(name)
    }

    /// The registered names in dispatch order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
