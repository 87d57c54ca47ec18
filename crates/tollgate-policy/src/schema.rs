//! Structural validation of untyped template payloads.
//!
//! # Purpose
//! Turns an arbitrary JSON value into a [`ValidatedTemplate`] or a non-empty list
//! of issues, each naming the offending field path.
//!
//! # Key invariants
//! - Validation never stops at the first problem; every malformed field and every
//!   malformed array element is reported on its own path.
//! - No partial template escapes: any issue means `Err`.
//! - Unknown fields are ignored and dropped from the typed result.
//! - Never panics on hostile input; everything resolves to an issue.
use crate::errors::{ValidationIssue, ValidationIssues};
use crate::template::{
    Binding, Lifecycle, Provenance, Template, TemplateSpec, Transition, ValidatedTemplate,
};
use serde_json::{Map, Value};
use std::fmt;

/// Location of a field inside the payload, rendered as `bindings[1].role`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPath(Vec<Segment>);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key.to_string()));
        Self(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if position == 0 => f.write_str(key)?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Decode a raw request body into an untyped payload.
///
/// # Errors
/// - A single root-path issue when the bytes are not JSON.
pub fn parse_payload(body: &[u8]) -> Result<Value, ValidationIssues> {
    serde_json::from_slice(body).map_err(|err| {
        ValidationIssues::single(
            FieldPath::root().to_string(),
            format!("request body is not valid JSON: {err}"),
        )
    })
}

/// Validate an untyped payload against the template contract.
///
/// # Errors
/// - Every structural violation found, in document order.
pub fn validate_template(payload: &Value) -> Result<ValidatedTemplate, ValidationIssues> {
    let mut checker = Checker::default();
    let template = check_template(&mut checker, payload);
    checker.finish(template)
}

fn check_template(checker: &mut Checker, payload: &Value) -> Option<Template> {
    let root = FieldPath::root();
    let object = checker.object(payload, &root)?;

    // Run every field check before short-circuiting so all issues are collected.
    let id = checker.required_string(object, &root, "id");
    let provenance = check_provenance(checker, object, &root);
    let bindings = check_bindings(checker, object, &root);
    let lifecycle = check_lifecycle(checker, object, &root);
    let spec = check_spec(checker, object, &root);

    Some(Template {
        id: id?,
        provenance: provenance?,
        bindings: bindings?,
        lifecycle: lifecycle?,
        spec: spec?,
    })
}

fn check_provenance(
    checker: &mut Checker,
    parent: &Map<String, Value>,
    parent_path: &FieldPath,
) -> Option<Provenance> {
    let (object, path) = checker.required_object(parent, parent_path, "provenance")?;
    let created_by = checker.required_string(object, &path, "created_by")?;
    Some(Provenance { created_by })
}

fn check_bindings(
    checker: &mut Checker,
    parent: &Map<String, Value>,
    parent_path: &FieldPath,
) -> Option<Vec<Binding>> {
    let (items, path) = checker.required_array(parent, parent_path, "bindings")?;
    collect_all(items, |index, item| {
        check_binding(checker, item, &path.index(index))
    })
}

fn check_binding(checker: &mut Checker, item: &Value, path: &FieldPath) -> Option<Binding> {
    let object = checker.object(item, path)?;
    let role = checker.required_string(object, path, "role");
    let principal = checker.required_string(object, path, "principal");
    Some(Binding {
        role: role?,
        principal: principal?,
    })
}

fn check_lifecycle(
    checker: &mut Checker,
    parent: &Map<String, Value>,
    parent_path: &FieldPath,
) -> Option<Lifecycle> {
    let (object, path) = checker.required_object(parent, parent_path, "lifecycle")?;
    let (items, transitions_path) = checker.required_array(object, &path, "transitions")?;
    let transitions = collect_all(items, |index, item| {
        check_transition(checker, item, &transitions_path.index(index))
    })?;
    Some(Lifecycle { transitions })
}

fn check_transition(checker: &mut Checker, item: &Value, path: &FieldPath) -> Option<Transition> {
    let states = checker.array(item, path)?;
    let names: Vec<Option<String>> = states
        .iter()
        .enumerate()
        .map(|(index, state)| checker.string(state, &path.index(index)))
        .collect();
    if names.len() != 2 {
        checker.report(
            path,
            format!(
                "expected a [from, to] pair, received {} element(s)",
                names.len()
            ),
        );
        return None;
    }
    let mut names = names.into_iter();
    let from = names.next().flatten();
    let to = names.next().flatten();
    Some(Transition { from: from?, to: to? })
}

fn check_spec(
    checker: &mut Checker,
    parent: &Map<String, Value>,
    parent_path: &FieldPath,
) -> Option<TemplateSpec> {
    let (object, path) = checker.required_object(parent, parent_path, "spec")?;
    let kind = checker.required_string(object, &path, "kind");
    // `exec` may be absent, but when present it must be a string (null included).
    let exec = match object.get("exec") {
        None => Some(None),
        Some(value) => checker.string(value, &path.key("exec")).map(Some),
    };
    Some(TemplateSpec {
        kind: kind?,
        exec: exec?,
    })
}

/// Check every element, keeping going after failures so each one is reported.
fn collect_all<T>(
    items: &[Value],
    mut check: impl FnMut(usize, &Value) -> Option<T>,
) -> Option<Vec<T>> {
    let mut checked = Vec::with_capacity(items.len());
    let mut complete = true;
    for (index, item) in items.iter().enumerate() {
        match check(index, item) {
            Some(value) => checked.push(value),
            None => complete = false,
        }
    }
    complete.then_some(checked)
}

/// JSON type name used in issue and integrity messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Default)]
struct Checker {
    issues: Vec<ValidationIssue>,
}

impl Checker {
    fn report(&mut self, path: &FieldPath, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: path.to_string(),
            message: message.into(),
        });
    }

    fn mismatch(&mut self, path: &FieldPath, expected: &str, value: &Value) {
        self.report(
            path,
            format!("expected {expected}, received {}", kind_of(value)),
        );
    }

    fn object<'a>(&mut self, value: &'a Value, path: &FieldPath) -> Option<&'a Map<String, Value>> {
        match value {
            Value::Object(object) => Some(object),
            other => {
                self.mismatch(path, "object", other);
                None
            }
        }
    }

    fn array<'a>(&mut self, value: &'a Value, path: &FieldPath) -> Option<&'a [Value]> {
        match value {
            Value::Array(items) => Some(items.as_slice()),
            other => {
                self.mismatch(path, "array", other);
                None
            }
        }
    }

    fn string(&mut self, value: &Value, path: &FieldPath) -> Option<String> {
        match value {
            Value::String(text) => Some(text.clone()),
            other => {
                self.mismatch(path, "string", other);
                None
            }
        }
    }

    fn required<'a>(
        &mut self,
        parent: &'a Map<String, Value>,
        parent_path: &FieldPath,
        key: &str,
    ) -> Option<(&'a Value, FieldPath)> {
        let path = parent_path.key(key);
        match parent.get(key) {
            Some(value) => Some((value, path)),
            None => {
                self.report(&path, "required");
                None
            }
        }
    }

    fn required_string(
        &mut self,
        parent: &Map<String, Value>,
        parent_path: &FieldPath,
        key: &str,
    ) -> Option<String> {
        let (value, path) = self.required(parent, parent_path, key)?;
        self.string(value, &path)
    }

    fn required_object<'a>(
        &mut self,
        parent: &'a Map<String, Value>,
        parent_path: &FieldPath,
        key: &str,
    ) -> Option<(&'a Map<String, Value>, FieldPath)> {
        let (value, path) = self.required(parent, parent_path, key)?;
        let object = self.object(value, &path)?;
        Some((object, path))
    }

    fn required_array<'a>(
        &mut self,
        parent: &'a Map<String, Value>,
        parent_path: &FieldPath,
        key: &str,
    ) -> Option<(&'a [Value], FieldPath)> {
        let (value, path) = self.required(parent, parent_path, key)?;
        let items = self.array(value, &path)?;
        Some((items, path))
    }

    fn finish(self, template: Option<Template>) -> Result<ValidatedTemplate, ValidationIssues> {
        if let Some(issues) = ValidationIssues::from_vec(self.issues) {
            return Err(issues);
        }
        template.map(ValidatedTemplate::new).ok_or_else(|| {
            ValidationIssues::single(FieldPath::root().to_string(), "template is incomplete")
        })
    }
}
