use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionKind {
    KeywordCall,
    VariableLookup,
    RawExpression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableScope {
    Local,
    TestCase,
    Suite,
    Global,
}

/// Outbound action shipped back to the instrumented process by the transport
/// layer. The controller emits at most one per pausing-point decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    PauseExecution,
    EvaluateCondition {
        expression: String,
    },
    EvaluateExpression {
        kind: ExpressionKind,
        id: Uuid,
        payload: String,
    },
    ChangeVariable {
        name: String,
        scope: VariableScope,
        frame_level: usize,
        path: Option<Vec<String>>,
        arguments: Vec<String>,
    },
}
