//! Query requests.

use periscope_context::Context;
use serde_json::{Map, Value};

/// Everything needed to run one query.
///
/// # Example
///
/// ```
/// use periscope_context::Context;
/// use periscope_engine::Request;
/// use serde_json::json;
///
/// struct Viewer(u64);
///
/// let request = Request::new("query Item($id: ID!) { item(id: $id) { name } }")
///     .with_operation_name("Item")
///     .with_variable("id", json!("42"))
///     .with_context(Context::new().with(Viewer(7)));
///
/// assert_eq!(request.variables["id"], json!("42"));
/// assert!(request.context.contains::<Viewer>());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Query document text.
    pub query: String,
    /// Operation to run when the document defines several.
    pub operation_name: Option<String>,
    /// Variable values supplied by the caller.
    pub variables: Map<String, Value>,
    /// Source value for top-level fields.
    pub root_value: Value,
    /// Caller context, the starting point of the context chain.
    pub context: Context,
}

impl Request {
    /// Creates a request for `query`.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Selects the operation to run.
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Replaces all variable values.
    #[must_use]
    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    /// Sets one variable value.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Sets the root value.
    #[must_use]
    pub fn with_root_value(mut self, root_value: Value) -> Self {
        self.root_value = root_value;
        self
    }

    /// Sets the caller context.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

impl From<&str> for Request {
    fn from(query: &str) -> Self {
        Request::new(query)
    }
}

impl From<String> for Request {
    fn from(query: String) -> Self {
        Request::new(query)
    }
}
