//! Stored procedure source reconstruction.
//!
//! `RDB$PROCEDURES.RDB$PROCEDURE_SOURCE` holds only the body of a procedure.
//! The parameter header lives in `RDB$PROCEDURE_PARAMETERS`, so a compilable
//! definition has to be put back together:
//!
//! ```text
//! (<inputs>)                      only when there are input parameters
//! RETURNS (<outputs>)             only when there are output parameters
//! AS
//! DECLARE VARIABLE <NAME> VARCHAR(100);   one per inferred local variable
//! <body>
//! ```
//!
//! Local variables are inferred from `:NAME` references in the body. Every
//! inferred variable is declared as `VARCHAR(100)`; the body does not carry
//! enough information to recover the real type.

use indexmap::IndexSet;
use std::collections::HashSet;

use crate::identifier::quote_identifier_lossy;

/// Legacy ISQL batch terminator left behind in exported sources.
pub const LEGACY_TERMINATOR: char = '^';

/// Type given to every inferred local variable.
pub const INFERRED_VARIABLE_TYPE: &str = "VARCHAR(100)";

/// A procedure parameter as read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureParameter {
    pub name: String,
    pub data_type: String,
}

impl ProcedureParameter {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Input and output parameters of a procedure, in parameter-number order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureSignature {
    pub inputs: Vec<ProcedureParameter>,
    pub outputs: Vec<ProcedureParameter>,
}

impl ProcedureSignature {
    pub fn new(inputs: Vec<ProcedureParameter>, outputs: Vec<ProcedureParameter>) -> Self {
        Self { inputs, outputs }
    }

    /// Signature with output parameters only.
    pub fn with_outputs(outputs: Vec<ProcedureParameter>) -> Self {
        Self {
            inputs: Vec::new(),
            outputs,
        }
    }

    fn is_parameter(&self, name: &str) -> bool {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .any(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// Rebuild a self-contained procedure definition from its catalog body.
///
/// The result follows the procedure name in a `CREATE OR ALTER PROCEDURE`
/// statement and is what gets persisted in the snapshot.
pub fn reconstruct(name: &str, raw_source: &str, signature: &ProcedureSignature) -> String {
    let source = strip_terminators(raw_source);
    let variables = inferred_variables(&source, signature);

    let mut text = String::new();
    text.push_str(&parameter_header(&signature.inputs));
    text.push_str(&returns_header(&signature.outputs));
    text.push_str("AS\n");
    for variable in &variables {
        text.push_str(&format!(
            "DECLARE VARIABLE {variable} {INFERRED_VARIABLE_TYPE};\n"
        ));
    }
    text.push_str(&source);

    tracing::debug!(
        "Reconstructed procedure {} ({} inputs, {} outputs, {} inferred variables)",
        name,
        signature.inputs.len(),
        signature.outputs.len(),
        variables.len()
    );
    text
}

/// Trim the source and remove every legacy terminator character.
pub fn strip_terminators(source: &str) -> String {
    source
        .trim()
        .replace(LEGACY_TERMINATOR, "")
        .trim()
        .to_string()
}

/// `RETURNS (p1 t1, p2 t2)` plus a newline, or empty without outputs.
pub fn returns_header(outputs: &[ProcedureParameter]) -> String {
    if outputs.is_empty() {
        return String::new();
    }
    format!("RETURNS ({})\n", render_parameters(outputs))
}

/// `(a t1, b t2)` plus a newline, or empty without inputs.
pub fn parameter_header(inputs: &[ProcedureParameter]) -> String {
    if inputs.is_empty() {
        return String::new();
    }
    format!("({})\n", render_parameters(inputs))
}

fn render_parameters(parameters: &[ProcedureParameter]) -> String {
    parameters
        .iter()
        .map(|p| format!("{} {}", quote_identifier_lossy(&p.name), p.data_type))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Local variable names the body references but never declares.
///
/// Names are uppercased and kept in first-occurrence order. Parameters
/// (compared case-insensitively) and variables the body declares itself are
/// excluded.
pub fn inferred_variables(source: &str, signature: &ProcedureSignature) -> IndexSet<String> {
    let declared = declared_variables(source);

    Tokenizer::new(source)
        .filter_map(|token| match token {
            Token::Variable(name) => Some(name.to_uppercase()),
            _ => None,
        })
        .filter(|name| !signature.is_parameter(name) && !declared.contains(name))
        .collect()
}

/// Names introduced by `DECLARE [VARIABLE] <name>` in the body, uppercased.
fn declared_variables(source: &str) -> HashSet<String> {
    let mut declared = HashSet::new();
    let mut tokens = Tokenizer::new(source).peekable();

    while let Some(token) = tokens.next() {
        if !matches!(token, Token::Word(w) if w.eq_ignore_ascii_case("DECLARE")) {
            continue;
        }
        if matches!(tokens.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case("VARIABLE")) {
            tokens.next();
        }
        if let Some(Token::Word(name)) = tokens.next() {
            declared.insert(name.to_uppercase());
        }
    }
    declared
}

// ============================================================================
// Tokenizer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    /// `:NAME` reference, without the colon
    Variable(&'a str),
    /// Bare word: keyword or unquoted identifier
    Word(&'a str),
    /// Anything else that is not skipped
    Symbol,
}

/// PSQL scanner.
///
/// Skips whitespace, string literals, quoted identifiers and comments, so
/// text such as `'10:30'` never yields a variable reference.
struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Advance while `pred` holds and return the consumed slice.
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.src[start..self.pos]
    }

    /// Skip a quoted section opened by `quote`, where a doubled quote is an
    /// escape. Unterminated sections run to the end of input.
    fn skip_quoted(&mut self, quote: char) {
        self.pos += quote.len_utf8();
        while let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
            if c == quote {
                if self.peek_char() == Some(quote) {
                    self.pos += quote.len_utf8();
                } else {
                    return;
                }
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        match self.rest().find("*/") {
            Some(end) => self.pos += end + 2,
            None => self.pos = self.src.len(),
        }
    }

    fn skip_line_comment(&mut self) {
        match self.rest().find('\n') {
            Some(end) => self.pos += end + 1,
            None => self.pos = self.src.len(),
        }
    }
}

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn is_variable_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            let c = self.peek_char()?;
            let rest = self.rest();

            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else if c == '\'' || c == '"' {
                self.skip_quoted(c);
            } else if rest.starts_with("/*") {
                self.skip_block_comment();
            } else if rest.starts_with("--") {
                self.skip_line_comment();
            } else if c == ':' {
                self.pos += 1;
                if self.peek_char().is_some_and(|n| n.is_ascii_alphabetic()) {
                    return Some(Token::Variable(self.take_while(is_variable_char)));
                }
                return Some(Token::Symbol);
            } else if is_word_start(c) {
                return Some(Token::Word(self.take_while(is_word_char)));
            } else {
                self.pos += c.len_utf8();
                return Some(Token::Symbol);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs(params: &[(&str, &str)]) -> ProcedureSignature {
        ProcedureSignature::with_outputs(
            params
                .iter()
                .map(|(n, t)| ProcedureParameter::new(*n, *t))
                .collect(),
        )
    }

    #[test]
    fn test_repeated_variable_declared_once_and_outputs_skipped() {
        let source = "BEGIN\n  SELECT X FROM T INTO :A;\n  B = :A;\n  SUSPEND;\nEND";
        let source = format!("{source}\n-- :B\n/* ok */ C = :B || :A;");
        let result = reconstruct("P", &source, &outputs(&[("B", "INTEGER")]));

        assert_eq!(result.matches("DECLARE VARIABLE A VARCHAR(100);").count(), 1);
        assert!(!result.contains("DECLARE VARIABLE B"));
    }

    #[test]
    fn test_scenario_a_b_a() {
        let result = reconstruct("P", ":A :B :A", &outputs(&[("B", "INTEGER")]));
        assert_eq!(
            result,
            "RETURNS (B INTEGER)\nAS\nDECLARE VARIABLE A VARCHAR(100);\n:A :B :A"
        );
    }

    #[test]
    fn test_no_outputs_means_no_returns() {
        let result = reconstruct("P", "BEGIN END", &ProcedureSignature::default());
        assert_eq!(result, "AS\nBEGIN END");
        assert!(!result.contains("RETURNS"));
    }

    #[test]
    fn test_returns_header_order() {
        let signature = outputs(&[("X", "INTEGER"), ("Y", "VARCHAR(10)")]);
        assert_eq!(
            returns_header(&signature.outputs),
            "RETURNS (X INTEGER, Y VARCHAR(10))\n"
        );
        assert!(reconstruct("P", "BEGIN END", &signature)
            .starts_with("RETURNS (X INTEGER, Y VARCHAR(10))\nAS\n"));
    }

    #[test]
    fn test_terminators_stripped() {
        let result = reconstruct(
            "P",
            "  BEGIN\n  SUSPEND;\nEND^\n",
            &ProcedureSignature::default(),
        );
        assert_eq!(result, "AS\nBEGIN\n  SUSPEND;\nEND");
        assert!(!result.contains('^'));
    }

    #[test]
    fn test_reconstruction_is_deterministic() {
        let raw = "BEGIN\n  :Z = 1; :A = 2; :Z = 3;\nEND^";
        let signature = outputs(&[("OUT1", "DATE")]);
        let first = reconstruct("P", raw, &signature);
        let second = reconstruct("P", raw, &signature);
        assert_eq!(first, second);
        assert_eq!(first.matches("DECLARE VARIABLE").count(), 2);
    }

    #[test]
    fn test_first_occurrence_order() {
        let vars = inferred_variables(":ZETA :ALPHA :ZETA :MID", &ProcedureSignature::default());
        let names: Vec<&str> = vars.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["ZETA", "ALPHA", "MID"]);
    }

    #[test]
    fn test_case_insensitive_dedup() {
        let signature = outputs(&[("Total", "INTEGER")]);
        let vars = inferred_variables(":count :COUNT :total", &signature);
        let names: Vec<&str> = vars.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["COUNT"]);
    }

    #[test]
    fn test_literals_and_comments_are_not_scanned() {
        let source = "BEGIN\n  T = '10:30 :NOT_A_VAR';\n  /* :ALSO_NOT */\n  \
                      -- :NOR_THIS\n  \"Q:X\" = :REAL;\nEND";
        let vars = inferred_variables(source, &ProcedureSignature::default());
        let names: Vec<&str> = vars.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["REAL"]);
    }

    #[test]
    fn test_escaped_quotes_inside_literal() {
        let vars = inferred_variables(
            "X = 'it''s :NOPE'; Y = :YES;",
            &ProcedureSignature::default(),
        );
        assert_eq!(vars.len(), 1);
        assert!(vars.contains("YES"));
    }

    #[test]
    fn test_numeric_colon_tokens_ignored() {
        let vars = inferred_variables("X = :1; Y = :_A;", &ProcedureSignature::default());
        assert!(vars.is_empty());
    }

    #[test]
    fn test_already_declared_variables_not_redeclared() {
        let source = "DECLARE VARIABLE CNT INTEGER;\nDECLARE tmp DATE;\n\
                      BEGIN\n  :CNT = 1; :TMP = 2; :OTHER = 3;\nEND";
        let result = reconstruct("P", source, &ProcedureSignature::default());
        assert!(!result.contains("DECLARE VARIABLE CNT VARCHAR(100);"));
        assert!(!result.contains("DECLARE VARIABLE TMP VARCHAR(100);"));
        assert!(result.contains("DECLARE VARIABLE OTHER VARCHAR(100);"));
    }

    #[test]
    fn test_input_parameters() {
        let signature = ProcedureSignature::new(
            vec![ProcedureParameter::new("CUSTOMER_ID", "INTEGER")],
            vec![ProcedureParameter::new("NAME", "VARCHAR(50)")],
        );
        let source = "BEGIN\n  \
                      SELECT NAME FROM CUSTOMERS WHERE ID = :CUSTOMER_ID INTO :NAME;\n  \
                      SUSPEND;\nEND";
        let result = reconstruct("GET_NAME", source, &signature);

        assert!(result
            .starts_with("(CUSTOMER_ID INTEGER)\nRETURNS (NAME VARCHAR(50))\nAS\nBEGIN"));
        assert!(!result.contains("DECLARE VARIABLE"));
    }

    #[test]
    fn test_non_ascii_text_is_handled() {
        let vars = inferred_variables(
            "X = 'zażółć'; Ł = :GĘŚ;",
            &ProcedureSignature::default(),
        );
        let names: Vec<&str> = vars.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["G"]);
    }

    #[test]
    fn test_parameter_names_are_quoted_like_columns() {
        let signature = ProcedureSignature::new(
            vec![ProcedureParameter::new("customerId", "INTEGER")],
            vec![
                ProcedureParameter::new("Total", "NUMERIC(18,2)"),
                ProcedureParameter::new("VALUE", "INTEGER"),
                ProcedureParameter::new("COUNTER", "INTEGER"),
            ],
        );
        let result = reconstruct("P", "BEGIN\n  SUSPEND;\nEND", &signature);
        assert_eq!(
            result,
            "(\"customerId\" INTEGER)\n\
             RETURNS (\"Total\" NUMERIC(18,2), \"VALUE\" INTEGER, COUNTER INTEGER)\n\
             AS\nBEGIN\n  SUSPEND;\nEND"
        );
    }
}
