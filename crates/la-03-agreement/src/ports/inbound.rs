//! # Inbound Ports

use crate::domain::{AgreementError, AgreementState, ProposalRequest};
use async_trait::async_trait;
use shared_channel::Delivery;
use shared_types::{LinearId, PartyName};

/// Agreement API - inbound port.
#[async_trait]
pub trait AgreementApi: Send + Sync {
    /// The party this service acts for.
    fn party(&self) -> &PartyName;

    /// Agree on `payload` with `counterparty`, using the default deadline.
    ///
    /// # Returns
    ///
    /// The `LinearId` of the record now committed at both parties.
    async fn initiate(
        &self,
        counterparty: &PartyName,
        payload: &str,
    ) -> Result<LinearId, AgreementError>;

    /// Agree on a record with every participant in `request`.
    async fn initiate_with(&self, request: ProposalRequest) -> Result<LinearId, AgreementError>;

    /// Answer one inbound protocol message.
    async fn respond(&self, delivery: Delivery) -> Result<(), AgreementError>;

    /// State of an agreement this party initiated.
    fn session_state(&self, linear_id: &LinearId) -> Option<AgreementState>;
}
