//! Splice/template processor.
//!
//! Templates are plain text with three kinds of directives:
//! - `$splice(Name)` anywhere in a line is replaced by the text of the splice
//!   command `Name`. Continuation lines of multi-line text are indented to the
//!   line the token sits on.
//! - A line `$include("path")` is replaced by the processed contents of `path`,
//!   resolved against the shared template directory.
//! - A line `$Tag.name: rest` keeps `rest` only where the field is active.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::{GenerationError, Result};

use super::fields::{ActiveFields, Field, FieldActivity};
use super::keywords::permutations_condition;

lazy_static! {
    static ref PREDICATE_REGEX: Regex =
        Regex::new(r"^(\s*)\$([A-Za-z_]\w*(?:\.\w+)+):\s?(.*)$").unwrap();
    static ref INCLUDE_REGEX: Regex = Regex::new(r#"^(\s*)\$include\("([^"]*)"\)\s*$"#).unwrap();
    static ref SPLICE_REGEX: Regex = Regex::new(r"\$splice\((\w+)\)").unwrap();
}

/// Token name to generated text, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct SpliceCommands {
    commands: Vec<(String, String)>,
}

impl SpliceCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text of `name`, replacing an earlier command of the same name
    /// in place.
    pub fn add(&mut self, name: &str, text: impl Into<String>) {
        let text = text.into();
        match self.commands.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = text,
            None => self.commands.push((name.to_string(), text)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.commands
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, text)| text.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedTemplate {
    pub text: String,
    /// Template first, then every include in first-touch order.
    pub dependencies: Vec<PathBuf>,
}

struct Processor<'a> {
    commands: &'a SpliceCommands,
    active: &'a ActiveFields,
    shared_dir: &'a Path,
    debug: bool,
    used: HashSet<String>,
    dependencies: Vec<PathBuf>,
    stack: Vec<PathBuf>,
    out: String,
}

/// Splits a line into its body and its terminator (`"\r\n"`, `"\n"` or `""`).
fn split_ending(chunk: &str) -> (&str, &str) {
    if let Some(body) = chunk.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = chunk.strip_suffix('\n') {
        (body, "\n")
    } else {
        (chunk, "")
    }
}

impl Processor<'_> {
    fn process_file(&mut self, path: &Path, indent: &str) -> Result<()> {
        let text = fs::read_to_string(path).map_err(|source| GenerationError::TemplateIo {
            path: path.to_path_buf(),
            source,
        })?;
        if !self.dependencies.iter().any(|d| d == path) {
            self.dependencies.push(path.to_path_buf());
        }
        self.stack.push(path.to_path_buf());
        for chunk in text.split_inclusive('\n') {
            let (line, ending) = split_ending(chunk);
            self.process_line(line, ending, indent, path)?;
        }
        self.stack.pop();
        Ok(())
    }

    /// Directive lines introduced by the processor end like the line they wrap.
    fn push_directive(&mut self, text: &str, ending: &str) {
        self.out.push_str(text);
        self.out.push_str(if ending.is_empty() { "\n" } else { ending });
    }

    fn process_line(&mut self, line: &str, ending: &str, indent: &str, file: &Path) -> Result<()> {
        if let Some(caps) = PREDICATE_REGEX.captures(line) {
            let lead = &caps[1];
            let rest = &caps[3];
            let inner = format!("{lead}{rest}");
            return match self.active.activity(&Field::from(&caps[2])) {
                FieldActivity::Always => self.process_line(&inner, ending, indent, file),
                FieldActivity::Permutations(indices) => {
                    let open = format!("{indent}{lead}#if {}", permutations_condition(&indices));
                    self.push_directive(&open, ending);
                    self.process_line(&inner, ending, indent, file)?;
                    if !self.out.ends_with('\n') {
                        self.out.push('\n');
                    }
                    self.out.push_str(&format!("{indent}{lead}#endif"));
                    self.out.push_str(ending);
                    Ok(())
                }
                FieldActivity::Never => {
                    if self.debug {
                        self.out.push_str(&format!("{indent}{lead}// {rest}"));
                        self.out.push_str(ending);
                    }
                    Ok(())
                }
            };
        }

        if let Some(caps) = INCLUDE_REGEX.captures(line) {
            let nested_indent = format!("{indent}{}", &caps[1]);
            let path = self.shared_dir.join(&caps[2]);
            if self.stack.contains(&path) {
                return Err(GenerationError::RecursiveInclude {
                    path,
                    from: file.to_path_buf(),
                });
            }
            if !path.is_file() {
                return Err(GenerationError::IncludeNotFound {
                    path,
                    from: file.to_path_buf(),
                });
            }
            self.process_file(&path, &nested_indent)?;
            if !ending.is_empty() && !self.out.is_empty() && !self.out.ends_with('\n') {
                self.out.push_str(ending);
            }
            return Ok(());
        }

        let commands = self.commands;
        let lead: String = line.chars().take_while(|c| c.is_whitespace()).collect();
        let continuation = format!("{indent}{lead}");
        let mut result = String::with_capacity(line.len());
        let mut last = 0;
        for caps in SPLICE_REGEX.captures_iter(line) {
            let Some(token) = caps.get(0) else { continue };
            let name = &caps[1];
            let text = commands
                .get(name)
                .ok_or_else(|| GenerationError::MissingSpliceToken {
                    token: name.to_string(),
                    template: file.to_path_buf(),
                })?;
            self.used.insert(name.to_string());
            result.push_str(&line[last..token.start()]);
            result.push_str(&indent_continuation(text, &continuation));
            last = token.end();
        }
        result.push_str(&line[last..]);

        if !result.is_empty() {
            self.out.push_str(indent);
            self.out.push_str(&result);
        }
        self.out.push_str(ending);
        Ok(())
    }
}

fn indent_continuation(text: &str, indent: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(indent);
            }
        }
        out.push_str(line);
    }
    out
}

/// Processes the template at `path`.
///
/// Returns `Ok(None)` when the template itself does not exist; the caller
/// skips the pass. Missing splice tokens and broken includes are errors.
pub fn process_template(
    path: &Path,
    shared_dir: &Path,
    commands: &SpliceCommands,
    active: &ActiveFields,
    debug_output: bool,
) -> Result<Option<ProcessedTemplate>> {
    if !path.is_file() {
        debug!(template = %path.display(), "template not found");
        return Ok(None);
    }
    let mut processor = Processor {
        commands,
        active,
        shared_dir,
        debug: debug_output,
        used: HashSet::new(),
        dependencies: Vec::new(),
        stack: Vec::new(),
        out: String::new(),
    };
    processor.process_file(path, "")?;

    for name in commands.names().filter(|n| !processor.used.contains(*n)) {
        trace!(token = name, template = %path.display(), "splice command unused");
    }
    Ok(Some(ProcessedTemplate {
        text: processor.out,
        dependencies: processor.dependencies,
    }))
}
