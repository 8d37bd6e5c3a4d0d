use std::{ fmt::{ self,
                  Display,
                  Formatter },
           hash::{ Hash,
                   Hasher } };



/// The location in the source text where a token was found.  This structure is used all over the
/// interpreter to keep track where important things are found in the input.  This is used
/// extensively in the error reporting.
///
/// This is a read-only structure.  Use the field accessor methods to get the values.
#[derive(Clone, PartialEq, PartialOrd, Eq, Debug)]
pub struct SourceLocation
{
    /// Either the path to the file or a description of the source text.  For example text entered
    /// in the REPL will have a tag of "\<repl\>".
    path: String,

    /// The 1 based line number in the source text where the token was found.
    line: usize,

    /// The 1 based column number in the source text where the token was found.
    column: usize
}


impl Hash for SourceLocation
{
    fn hash<H: Hasher>(&self, state: &mut H)
    {
        self.path.hash(state);
        self.line.hash(state);
        self.column.hash(state);
    }
}


/// Used for error reporting to show where in the source text an error originated.
impl Display for SourceLocation
{
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), fmt::Error>
    {
        write!(formatter, "{} ({}, {})", self.path, self.line, self.column)
    }
}


impl Default for SourceLocation
{
    fn default() -> Self
    {
        Self::new()
    }
}


impl SourceLocation
{
    /// Crate a new SourceLocation with default values.
    pub fn new() -> SourceLocation
    {
        SourceLocation { path: "unspecified".to_string(), line: 1, column: 1 }
    }

    /// Create a new SourceLocation with the path to the source text.
    pub fn new_from_path(path: &str) -> Self
    {
        SourceLocation { path: path.to_owned(), line: 1, column: 1 }
    }

    /// Create a new SourceLocation with all of the needed information.  This is useful in
    /// conjunction with the location_here! macro.
    pub fn new_from_info(path: &str, line: usize, column: usize) -> Self
    {
        SourceLocation { path: path.to_owned(), line, column }
    }

    /// The path to the source text or a meaningful description of it.
    pub fn path(&self) -> &String
    {
        &self.path
    }

    /// The 1 based line number in the source text.
    pub fn line(&self) -> usize
    {
        self.line
    }

    /// The 1 based column number in the source text.
    pub fn column(&self) -> usize
    {
        self.column
    }
}



/// Helper macro to get the location of the macro invocation.  This is useful for error reporting
/// that includes locations within the Rust code where important operations are occurring.
#[macro_export]
macro_rules! location_here
{
    () =>
    {
        $crate::lang::source_buffer::SourceLocation::new_from_info(file!(),
                                      line!() as usize,
                                      column!() as usize)
    };
}



/// A saved cursor position.  Handing one back to `SourceBuffer::rewind` restores the buffer to
/// exactly the state it had when the mark was taken.
#[derive(Clone)]
pub struct Mark
{
    position: usize,
    location: SourceLocation
}



/// A buffer for scanning source text.  The tokenizer uses it to pull characters one at a time
/// while the buffer keeps track of the line and column of the cursor.  Unlike a plain character
/// iterator the cursor can be marked and rewound, which the tokenizer needs to back out of a
/// failed complex or matrix literal.
///
/// The SourceBuffer only holds a reference to the source text, the text is not copied.
pub struct SourceBuffer<'a>
{
    /// The text being scanned.
    source: &'a str,

    /// Byte offset of the cursor within `source`.  Always on a character boundary.
    position: usize,

    /// The logical location of the cursor in the source text.
    location: SourceLocation
}


impl<'a> SourceBuffer<'a>
{
    /// Create a new SourceBuffer with the path to, or meaningful tag for the source text and the
    /// text itself.
    pub fn new(path: &str, source: &'a str) -> Self
    {
        SourceBuffer
            {
                source,
                position: 0,
                location: SourceLocation::new_from_path(path)
            }
    }

    /// The location the cursor is at in the source text being processed.
    pub fn location(&self) -> &SourceLocation
    {
        &self.location
    }

    /// Everything from the cursor to the end of the text.
    pub fn remaining(&self) -> &'a str
    {
        &self.source[self.position..]
    }

    /// Have all of the characters been consumed?
    pub fn is_at_end(&self) -> bool
    {
        self.position >= self.source.len()
    }

    /// Take a peek at the next character in the source text without consuming it.
    pub fn peek_next(&self) -> Option<char>
    {
        self.remaining().chars().next()
    }

    /// Peek `offset` characters past the cursor, where an offset of 0 is the same as `peek_next`.
    pub fn peek_at(&self, offset: usize) -> Option<char>
    {
        self.remaining().chars().nth(offset)
    }

    /// Get and consume the next character in the source text.
    pub fn next_char(&mut self) -> Option<char>
    {
        let next = self.peek_next();

        if let Some(next_char) = next
        {
            self.position += next_char.len_utf8();
            self.increment_location(next_char);
        }

        next
    }

    /// Consume the next character only if it is the expected one.
    pub fn next_if(&mut self, expected: char) -> bool
    {
        if self.peek_next() == Some(expected)
        {
            let _ = self.next_char();
            return true;
        }

        false
    }

    /// Consume any whitespace at the cursor.
    pub fn skip_whitespace(&mut self)
    {
        while let Some(next) = self.peek_next()
        {
            if !next.is_whitespace()
            {
                break;
            }

            let _ = self.next_char();
        }
    }

    /// Remember the current cursor position.
    pub fn mark(&self) -> Mark
    {
        Mark { position: self.position, location: self.location.clone() }
    }

    /// Move the cursor back to a previously marked position.
    pub fn rewind(&mut self, mark: Mark)
    {
        self.position = mark.position;
        self.location = mark.location;
    }

    /// The text consumed since the mark was taken.
    pub fn text_since(&self, mark: &Mark) -> &'a str
    {
        &self.source[mark.position..self.position]
    }

    /// Advance one column for regular characters.  Reset the colum to 1 and increment the line for
    /// new line characters.
    fn increment_location(&mut self, next: char)
    {
        if next == '\n'
        {
            self.location.line += 1;
            self.location.column = 1;
        }
        else
        {
            self.location.column += 1;
        }
    }
}
