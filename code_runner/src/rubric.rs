//! Typed view of an assignment rubric.
//!
//! The uploaded document looks like
//!
//! ```json
//! {
//!   "files": ["search.py"],
//!   "test_cases": {
//!     "search.py": { "bfs": "expected-A", "dfs": { "maze1": "expected-B" } }
//!   }
//! }
//! ```
//!
//! Every path from the root of `test_cases` to a string leaf is one command:
//! the first key names the script, the remaining keys are its arguments, and
//! the leaf is the expected output shown next to the actual one.

use crate::error::RunnerError;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum TestCaseNode {
    Branch(Vec<(String, TestCaseNode)>),
    Leaf(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rubric {
    pub files: Vec<String>,
    pub test_cases: Vec<(String, TestCaseNode)>,
}

/// One runnable command collected from the test-case tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseLeaf {
    pub script: String,
    pub args: Vec<String>,
    pub expected: String,
}

impl Rubric {
    pub fn parse(text: &str) -> Result<Self, RunnerError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| RunnerError::InvalidRubric(format!("not valid JSON: {e}")))?;
        Rubric::try_from(&value)
    }

    /// Depth-first, document-ordered list of every command in the tree.
    pub fn leaves(&self) -> Vec<TestCaseLeaf> {
        collect_leaves(&self.test_cases)
    }

    /// The test-case tree with every expected output replaced by `null`.
    ///
    /// Stored on a new submission as the grader's feedback scaffold.
    pub fn feedback_skeleton(&self) -> Value {
        skeleton_of(&self.test_cases)
    }
}

pub fn collect_leaves(tree: &[(String, TestCaseNode)]) -> Vec<TestCaseLeaf> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    walk(tree, &mut path, &mut out);
    out
}

fn walk(children: &[(String, TestCaseNode)], path: &mut Vec<String>, out: &mut Vec<TestCaseLeaf>) {
    for (key, node) in children {
        path.push(key.clone());
        match node {
            TestCaseNode::Branch(grandchildren) => walk(grandchildren, path, out),
            // `path` holds at least `key` here.
            TestCaseNode::Leaf(expected) => out.push(TestCaseLeaf {
                script: path[0].clone(),
                args: path[1..].to_vec(),
                expected: expected.clone(),
            }),
        }
        path.pop();
    }
}

fn skeleton_of(children: &[(String, TestCaseNode)]) -> Value {
    let mut map = Map::new();
    for (key, node) in children {
        let value = match node {
            TestCaseNode::Branch(grandchildren) => skeleton_of(grandchildren),
            TestCaseNode::Leaf(_) => Value::Null,
        };
        map.insert(key.clone(), value);
    }
    Value::Object(map)
}

fn parse_children(map: &Map<String, Value>, at: &str) -> Result<Vec<(String, TestCaseNode)>, RunnerError> {
    map.iter()
        .map(|(key, value)| {
            let here = if at.is_empty() {
                key.clone()
            } else {
                format!("{at}.{key}")
            };
            TestCaseNode::parse(value, &here).map(|node| (key.clone(), node))
        })
        .collect()
}

impl TestCaseNode {
    fn parse(value: &Value, at: &str) -> Result<Self, RunnerError> {
        match value {
            Value::Object(map) => Ok(TestCaseNode::Branch(parse_children(map, at)?)),
            Value::String(expected) => Ok(TestCaseNode::Leaf(expected.clone())),
            other => Err(RunnerError::InvalidRubric(format!(
                "test case '{at}' must be an object or a string, found {}",
                json_kind(other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl TryFrom<&Value> for Rubric {
    type Error = RunnerError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let Value::Object(root) = value else {
            return Err(RunnerError::InvalidRubric(
                "rubric must be a JSON object".into(),
            ));
        };

        let files = match root.get("files") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        RunnerError::InvalidRubric("'files' must contain only strings".into())
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(RunnerError::InvalidRubric(
                    "'files' must be an array of file names".into(),
                ));
            }
        };

        let test_cases = match root.get("test_cases") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(map)) => parse_children(map, "")?,
            Some(_) => {
                return Err(RunnerError::InvalidRubric(
                    "'test_cases' must be an object keyed by script name".into(),
                ));
            }
        };

        Ok(Rubric { files, test_cases })
    }
}
