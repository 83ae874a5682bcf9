//! The external workflow object: construction, status projection and the
//! resume patch.

pub mod object;
pub mod params;
pub mod status;

pub use object::{
    SUSPENDED_CONDITION, WORKFLOW_API_VERSION, WORKFLOW_KIND, WORKFLOW_TEMPLATE_KIND, Workflow,
    WorkflowCondition, WorkflowNode, WorkflowSpec, WorkflowStatus, WorkflowTemplate,
    build_workflow,
};
pub use params::{
    DEFAULT_WORKFLOW_NAMESPACE, DEFAULT_WORKFLOW_TEMPLATE, Parameter, ParameterValue,
    WorkflowDefaults, WorkflowParams,
};
pub use status::{NodeCounts, WorkflowPhase, WorkflowState};
