pub mod fetch_gateway;
pub mod gateway_model;
pub mod transport;

pub use fetch_gateway::FetchGateway;
pub use gateway_model::{
    data_array, error_message, require_data, FetchOutcome, LoginGrant, RawResponse,
    TransactionQuery, CATEGORIES_PATH, CHART_DAILY_PATH, LOGIN_FAILED_MESSAGE, LOGIN_PATH,
    SUMMARY_PATH, TRANSACTIONS_PATH, UNREACHABLE_MESSAGE,
};
pub use transport::{HttpTransport, Transport};
