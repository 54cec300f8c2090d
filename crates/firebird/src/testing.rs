//! In-memory catalog for tests.
//!
//! [`InMemoryCatalog`] serves seeded catalog rows through [`CatalogSource`]
//! and understands the statements the DDL generator emits, so a snapshot can
//! be applied to it and read back without a server. Like the real server it
//! rejects an unguarded `CREATE` of an object that already exists.

use firebird_types::{parse_canonical_type, FieldDescriptor};

use crate::catalog::{CatalogSource, FieldRow, ParameterDirection, ParameterRow, ProcedureRow};
use crate::error::{Error, Result};
use crate::executor::StatementExecutor;

#[derive(Debug, Clone)]
struct Relation {
    name: String,
    fields: Vec<FieldRow>,
}

#[derive(Debug, Clone)]
struct Procedure {
    name: String,
    source: Option<String>,
    inputs: Vec<ParameterRow>,
    outputs: Vec<ParameterRow>,
}

/// Catalog state kept in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    fields: Vec<FieldRow>,
    relations: Vec<Relation>,
    procedures: Vec<Procedure>,
    executed: Vec<String>,
    failing_query: Option<&'static str>,
    next_field_id: usize,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, field: FieldRow) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_table(mut self, name: impl Into<String>, fields: Vec<FieldRow>) -> Self {
        self.relations.push(Relation {
            name: name.into(),
            fields,
        });
        self
    }

    pub fn with_procedure(
        mut self,
        name: impl Into<String>,
        source: Option<&str>,
        inputs: Vec<ParameterRow>,
        outputs: Vec<ParameterRow>,
    ) -> Self {
        self.procedures.push(Procedure {
            name: name.into(),
            source: source.map(str::to_string),
            inputs,
            outputs,
        });
        self
    }

    /// Make the named catalog read fail (`"domains"`, `"relations"`,
    /// `"relation fields"`, `"procedures"` or `"procedure parameters"`).
    pub fn with_failing_query(mut self, query: &'static str) -> Self {
        self.failing_query = Some(query);
        self
    }

    pub fn domain(&self, name: &str) -> Option<&FieldRow> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn domain_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn table_columns(&self, name: &str) -> Option<&[FieldRow]> {
        self.relations
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.fields.as_slice())
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.relations.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn procedure_names(&self) -> Vec<&str> {
        self.procedures.iter().map(|p| p.name.as_str()).collect()
    }

    /// Stored body of a procedure.
    pub fn procedure_source(&self, name: &str) -> Option<&str> {
        self.procedures
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.source.as_deref())
    }

    /// Every statement passed to [`StatementExecutor::execute`], in order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    fn check(&self, query: &'static str) -> Result<()> {
        if self.failing_query == Some(query) {
            return Err(Error::catalog(query, "simulated failure"));
        }
        Ok(())
    }

    fn has_domain(&self, name: &str) -> bool {
        self.domain(name).is_some()
    }

    fn has_table(&self, name: &str) -> bool {
        self.table_columns(name).is_some()
    }

    fn run(&mut self, sql: &str) -> Result<()> {
        let sql = sql.trim();
        if let Some(rest) = strip_keyword(sql, "EXECUTE BLOCK") {
            self.run_guarded(rest)
        } else if let Some(rest) = strip_keyword(sql, "CREATE DOMAIN") {
            self.create_domain(rest)
        } else if let Some(rest) = strip_keyword(sql, "CREATE TABLE") {
            self.create_table(rest)
        } else if let Some(rest) = strip_keyword(sql, "CREATE OR ALTER PROCEDURE") {
            self.create_or_alter_procedure(rest)
        } else {
            Err(unsupported(sql))
        }
    }

    fn run_guarded(&mut self, block: &str) -> Result<()> {
        let rest = after(block, "NOT EXISTS(SELECT 1 FROM ").ok_or_else(|| unsupported(block))?;
        let (catalog_table, rest) = rest.split_once(' ').ok_or_else(|| unsupported(block))?;
        let rest = after(rest, " = ").ok_or_else(|| unsupported(block))?;
        let (name, rest) = read_literal(rest).ok_or_else(|| unsupported(block))?;

        let exists = match catalog_table {
            "RDB$FIELDS" => self.has_domain(&name),
            "RDB$RELATIONS" => self.has_table(&name),
            _ => return Err(unsupported(block)),
        };
        if exists {
            return Ok(());
        }

        let rest = after(rest, "EXECUTE STATEMENT ").ok_or_else(|| unsupported(block))?;
        let (inner, _) = read_literal(rest).ok_or_else(|| unsupported(block))?;
        self.run(&inner)
    }

    fn create_domain(&mut self, rest: &str) -> Result<()> {
        let (name, rest) = read_identifier(rest).ok_or_else(|| unsupported(rest))?;
        let type_text = strip_keyword(rest, "AS").ok_or_else(|| unsupported(rest))?;
        let (type_text, not_null) = split_not_null(type_text);

        if self.has_domain(&name) {
            return Err(duplicate("RDB$FIELDS", &name));
        }
        let mut field = FieldRow::new(name, parse_canonical_type(type_text));
        if not_null {
            field = field.not_null();
        }
        self.fields.push(field);
        Ok(())
    }

    fn create_table(&mut self, rest: &str) -> Result<()> {
        let (name, rest) = read_identifier(rest).ok_or_else(|| unsupported(rest))?;
        let (body, _) = read_group(rest.trim_start()).ok_or_else(|| unsupported(rest))?;

        if self.has_table(&name) {
            return Err(duplicate("RDB$RELATIONS", &name));
        }

        let mut fields = Vec::new();
        for definition in split_top_level(body) {
            let (column, rest) =
                read_identifier(definition).ok_or_else(|| unsupported(definition))?;
            let (rest, not_null) = split_not_null(rest);
            let (type_text, default) = match find_keyword(rest, "DEFAULT") {
                Some(pos) => (&rest[..pos], Some(rest[pos..].trim().to_string())),
                None => (rest, None),
            };

            let mut field = FieldRow::new(column, self.descriptor_for(type_text.trim()));
            field.default_source = default;
            if not_null {
                field = field.not_null();
            }
            fields.push(field);
        }

        self.relations.push(Relation { name, fields });
        Ok(())
    }

    fn create_or_alter_procedure(&mut self, rest: &str) -> Result<()> {
        let (name, rest) = read_identifier(rest).ok_or_else(|| unsupported(rest))?;
        let mut rest = rest.trim_start();

        let mut inputs = Vec::new();
        if rest.starts_with('(') {
            let (list, tail) = read_group(rest).ok_or_else(|| unsupported(rest))?;
            inputs = self.parameters(list)?;
            rest = tail.trim_start();
        }
        let mut outputs = Vec::new();
        if let Some(tail) = strip_keyword(rest, "RETURNS") {
            let (list, tail) = read_group(tail).ok_or_else(|| unsupported(rest))?;
            outputs = self.parameters(list)?;
            rest = tail.trim_start();
        }
        let body = strip_keyword(rest, "AS").ok_or_else(|| unsupported(rest))?;
        let body = body.trim().trim_end_matches(';').trim_end().to_string();

        let procedure = Procedure {
            name,
            source: Some(body),
            inputs,
            outputs,
        };
        match self.procedures.iter_mut().find(|p| p.name == procedure.name) {
            Some(existing) => *existing = procedure,
            None => self.procedures.push(procedure),
        }
        Ok(())
    }

    fn parameters(&mut self, list: &str) -> Result<Vec<ParameterRow>> {
        split_top_level(list)
            .into_iter()
            .map(|definition| {
                let (name, type_text) =
                    read_identifier(definition).ok_or_else(|| unsupported(definition))?;
                let type_text = type_text.trim();
                let field = self.descriptor_for(type_text);
                let source = if self.has_domain(type_text) {
                    type_text.to_string()
                } else {
                    self.generated_field_name()
                };
                Ok(ParameterRow::new(name, source, field))
            })
            .collect()
    }

    /// Built-in type text or the descriptor of a declared domain.
    fn descriptor_for(&self, type_text: &str) -> FieldDescriptor {
        match self.domain(type_text) {
            Some(domain) => domain.descriptor(),
            None => parse_canonical_type(type_text),
        }
    }

    fn generated_field_name(&mut self) -> String {
        self.next_field_id += 1;
        format!("RDB${}", self.next_field_id)
    }
}

impl CatalogSource for InMemoryCatalog {
    fn fields(&mut self) -> Result<Vec<FieldRow>> {
        self.check("domains")?;
        let mut fields = self.fields.clone();
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fields)
    }

    fn relations(&mut self) -> Result<Vec<String>> {
        self.check("relations")?;
        let mut names: Vec<String> = self.relations.iter().map(|r| r.name.clone()).collect();
        names.sort();
        Ok(names)
    }

    fn relation_fields(&mut self, relation: &str) -> Result<Vec<FieldRow>> {
        self.check("relation fields")?;
        Ok(self.table_columns(relation).map(<[FieldRow]>::to_vec).unwrap_or_default())
    }

    fn procedures(&mut self) -> Result<Vec<ProcedureRow>> {
        self.check("procedures")?;
        let mut rows: Vec<ProcedureRow> = self
            .procedures
            .iter()
            .map(|p| ProcedureRow {
                name: p.name.clone(),
                source: p.source.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn procedure_parameters(
        &mut self,
        procedure: &str,
        direction: ParameterDirection,
    ) -> Result<Vec<ParameterRow>> {
        self.check("procedure parameters")?;
        let Some(procedure) = self.procedures.iter().find(|p| p.name == procedure) else {
            return Ok(Vec::new());
        };
        Ok(match direction {
            ParameterDirection::Input => procedure.inputs.clone(),
            ParameterDirection::Output => procedure.outputs.clone(),
        })
    }
}

impl StatementExecutor for InMemoryCatalog {
    fn execute(&mut self, sql: &str) -> Result<()> {
        self.executed.push(sql.to_string());
        self.run(sql)
    }
}

fn unsupported(sql: &str) -> Error {
    let head = sql.trim().lines().next().unwrap_or_default();
    Error::StatementExecution(format!("unsupported statement: {head}"))
}

fn duplicate(catalog_table: &str, name: &str) -> Error {
    Error::StatementExecution(format!(
        "unsuccessful metadata update: attempt to store duplicate value in {catalog_table}: {name}"
    ))
}

/// `text` without a leading case-insensitive `keyword` followed by whitespace.
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let text = text.trim_start();
    let head = text.get(..keyword.len())?;
    let tail = &text[keyword.len()..];
    let delimited = tail.starts_with(|c: char| c.is_whitespace() || c == '(');
    if head.eq_ignore_ascii_case(keyword) && delimited {
        Some(tail.trim_start())
    } else {
        None
    }
}

/// Text after the first occurrence of `marker`.
fn after<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.find(marker).map(|pos| &text[pos + marker.len()..])
}

/// Byte offset of a standalone case-insensitive `keyword` outside quotes.
fn find_keyword(text: &str, keyword: &str) -> Option<usize> {
    let mut quote = None;
    for (pos, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None => {
                let word_start = pos == 0 || text[..pos].ends_with(char::is_whitespace);
                if word_start && strip_keyword(&text[pos..], keyword).is_some() {
                    return Some(pos);
                }
            }
        }
    }
    None
}

/// Remove a trailing `NOT NULL`.
fn split_not_null(text: &str) -> (&str, bool) {
    let trimmed = text.trim_end();
    let len = trimmed.len();
    let has_suffix = len >= 8
        && trimmed.is_char_boundary(len - 8)
        && trimmed[len - 8..].eq_ignore_ascii_case("NOT NULL");
    if has_suffix {
        (trimmed[..len - 8].trim_end(), true)
    } else {
        (trimmed, false)
    }
}

/// A single-quoted literal at the start of `text`, unescaped.
fn read_literal(text: &str) -> Option<(String, &str)> {
    let body = text.strip_prefix('\'')?;
    let mut value = String::new();
    let mut chars = body.char_indices().peekable();
    while let Some((pos, c)) = chars.next() {
        if c == '\'' {
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                value.push('\'');
            } else {
                return Some((value, &body[pos + 1..]));
            }
        } else {
            value.push(c);
        }
    }
    None
}

/// A quoted or plain identifier at the start of `text`.
///
/// Plain identifiers are folded to upper case.
fn read_identifier(text: &str) -> Option<(String, &str)> {
    let text = text.trim_start();
    if let Some(body) = text.strip_prefix('"') {
        let mut name = String::new();
        let mut chars = body.char_indices().peekable();
        while let Some((pos, c)) = chars.next() {
            if c == '"' {
                if matches!(chars.peek(), Some((_, '"'))) {
                    chars.next();
                    name.push('"');
                } else {
                    return Some((name, &body[pos + 1..]));
                }
            } else {
                name.push(c);
            }
        }
        return None;
    }

    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(text.len());
    if end == 0 {
        return None;
    }
    Some((text[..end].to_ascii_uppercase(), &text[end..]))
}

/// Contents of the parenthesized group at the start of `text`.
fn read_group(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_prefix('(')?;
    let mut depth = 0usize;
    let mut quote = None;
    for (pos, c) in body.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') if depth == 0 => return Some((&body[..pos], &body[pos + 1..])),
            (None, ')') => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Split on commas outside quotes and parentheses.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote = None;
    let mut start = 0;
    for (pos, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(text[start..pos].trim());
                start = pos + 1;
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}
