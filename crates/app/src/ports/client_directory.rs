//! Client directory port: the client CRUD collaborator.
//!
//! Registration and status bookkeeping belong to the CRUD layer; the engine
//! only forwards what it learns from the broker.

use std::future::Future;

use mycohub_domain::client::{ClientId, ClientStatus, Registration};
use mycohub_domain::error::MycoError;

pub trait ClientDirectory {
    fn client_exists(
        &self,
        client_id: &ClientId,
    ) -> impl Future<Output = Result<bool, MycoError>> + Send;

    /// Create or refresh a client. New clients are provisioned with default
    /// ranges, actuators and operating mode.
    fn register_client(
        &self,
        client_id: &ClientId,
        registration: &Registration,
    ) -> impl Future<Output = Result<(), MycoError>> + Send;

    /// Move a client to `status`, honouring a manual disable.
    fn update_client_status(
        &self,
        client_id: &ClientId,
        status: ClientStatus,
    ) -> impl Future<Output = Result<(), MycoError>> + Send;
}
