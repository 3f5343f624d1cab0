//! Multi-line input collection for the REPL
//!
//! Weave blocks are keyword-delimited (`fn … endfn`, `if … endif`,
//! `while … endwhile`, `class … endclass`), so the collector buffers input
//! until every opened block is closed. Decorator lines (`@name`) belong to
//! the declaration that follows and keep the collector open.

/// Result of processing a line of input
#[derive(Debug)]
pub enum LineProcessResult {
    /// Input is complete and ready for execution
    Complete(String),
    /// More input is needed to complete the statement
    NeedMore,
}

/// Collects multi-line input for complete statements
pub struct MultiLineCollector {
    /// Buffer for collecting lines
    buffer: String,
    /// Number of currently open blocks
    depth: i32,
    /// Whether the previous line was a bare decorator
    pending_decorator: bool,
}

impl MultiLineCollector {
    /// Create a new multi-line collector
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            depth: 0,
            pending_decorator: false,
        }
    }

    /// Get the appropriate prompt for the current state
    pub fn prompt(&self) -> &'static str {
        if self.is_collecting() {
            "   " // Continuation prompt
        } else {
            ">> " // Main prompt
        }
    }

    /// Check if we're currently collecting a multi-line statement
    pub fn is_collecting(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Reset the collector state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.depth = 0;
        self.pending_decorator = false;
    }

    /// Process a line of input
    pub fn process_line(&mut self, line: &str) -> LineProcessResult {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(line);

        self.update_depth(line);

        if self.depth <= 0 && !self.pending_decorator {
            let mut complete = std::mem::take(&mut self.buffer);
            complete.push('\n');
            self.reset();
            LineProcessResult::Complete(complete)
        } else {
            LineProcessResult::NeedMore
        }
    }

    /// Track block nesting from the line's leading keyword. Blocks only
    /// open and close at statement heads, so the first word is enough.
    fn update_depth(&mut self, line: &str) {
        self.pending_decorator = false;
        let Some(word) = line.split_whitespace().next() else {
            return;
        };
        if word.starts_with("//") {
            return;
        }
        if word.starts_with('@') {
            self.pending_decorator = true;
            return;
        }
        match word {
            "fn" | "if" | "while" | "class" => self.depth += 1,
            "endfn" | "endif" | "endwhile" | "endclass" => self.depth -= 1,
            _ => {}
        }
    }
}

impl Default for MultiLineCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(collector: &mut MultiLineCollector, lines: &[&str]) -> Option<String> {
        for (i, line) in lines.iter().enumerate() {
            match collector.process_line(line) {
                LineProcessResult::Complete(source) => {
                    assert_eq!(i, lines.len() - 1, "completed early at line {i}");
                    return Some(source);
                }
                LineProcessResult::NeedMore => {}
            }
        }
        None
    }

    #[test]
    fn single_line_is_complete() {
        let mut collector = MultiLineCollector::new();
        let source = feed(&mut collector, &["1 + 2"]).unwrap();
        assert_eq!(source, "1 + 2\n");
        assert!(!collector.is_collecting());
    }

    #[test]
    fn blocks_collect_until_balanced() {
        let mut collector = MultiLineCollector::new();
        let source = feed(
            &mut collector,
            &["fn f()", "  if true", "    return 1", "  endif", "endfn"],
        )
        .unwrap();
        assert!(source.ends_with("endfn\n"));
    }

    #[test]
    fn decorator_lines_keep_collecting() {
        let mut collector = MultiLineCollector::new();
        assert!(matches!(
            collector.process_line("@trace"),
            LineProcessResult::NeedMore
        ));
        let source = feed(&mut collector, &["fn f()", "  return 1", "endfn"]).unwrap();
        assert!(source.starts_with("@trace\n"));
    }

    #[test]
    fn prompt_reflects_collection_state() {
        let mut collector = MultiLineCollector::new();
        assert_eq!(collector.prompt(), ">> ");
        collector.process_line("while true");
        assert_eq!(collector.prompt(), "   ");
        collector.reset();
        assert_eq!(collector.prompt(), ">> ");
    }

    #[test]
    fn keywords_inside_expressions_do_not_nest() {
        let mut collector = MultiLineCollector::new();
        assert!(feed(&mut collector, &["let s = \"fn\""]).is_some());
    }
}
