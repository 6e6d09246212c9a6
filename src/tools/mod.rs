pub mod executor;
pub mod registry;
pub mod request_params;
pub mod schema;
pub mod scripts;
pub mod transactions;

pub use executor::ToolExecutor;
pub use registry::{ActionTool, ToolOutput, ToolRegistry};
pub use request_params::RequestParametersTool;
pub use schema::{action_parameters_schema, param_request_schema_json};
pub use scripts::{
    register_script_tools, CheckSetupStatusTool, GetCurrentTimestampTool, GetUserBalanceTool,
    SetupObserver, TimeObserver,
};
pub use transactions::{register_transaction_tools, TransactionTool};
