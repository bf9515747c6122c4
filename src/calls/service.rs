//! Call Service
//! Mission: CRUD on calls, each operation restricted to the call's owner
//!
//! Checks run in a fixed order: existence, then ownership, then any
//! content validation that needs the located row. Probing an id you do not
//! own can therefore only ever yield `NotFound` when the row is absent.

use crate::calls::{
    models::{Call, CallStatus, CreateCallRequest},
    store::CallStore,
};
use crate::error::{ServiceError, ServiceResult};
use chrono::{SubsecRound, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

lazy_static! {
    static ref PHONE_NUMBER: Regex = Regex::new(r"^[0-9+\-]+$").unwrap();
}

pub fn is_valid_phone_number(phone: &str) -> bool {
    PHONE_NUMBER.is_match(phone)
}

#[derive(Clone)]
pub struct CallService {
    store: Arc<dyn CallStore>,
}

impl CallService {
    pub fn new(store: Arc<dyn CallStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, req: CreateCallRequest, caller: Uuid) -> ServiceResult<Call> {
        if !is_valid_phone_number(&req.phone_number) {
            return Err(ServiceError::InvalidFormat);
        }

        let call = Call {
            id: Uuid::new_v4(),
            client_name: req.client_name,
            phone_number: req.phone_number,
            description: req.description,
            status: CallStatus::Open,
            // Stored at microsecond precision
            created_at: Utc::now().trunc_subsecs(6),
            user_id: caller,
        };

        self.store.create(&call).await?;

        info!("📞 Call {} created by {}", call.id, caller);

        Ok(call)
    }

    pub async fn get(&self, id: Uuid, caller: Uuid) -> ServiceResult<Call> {
        self.locate_owned(id, caller).await
    }

    /// All calls owned by `caller`; empty when there are none.
    pub async fn list(&self, caller: Uuid) -> ServiceResult<Vec<Call>> {
        Ok(self.store.list_by_owner(caller).await?)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        target_status: &str,
        caller: Uuid,
    ) -> ServiceResult<()> {
        let call = self.locate_owned(id, caller).await?;
        let status = CallStatus::parse(target_status).ok_or(ServiceError::InvalidStatus)?;

        // The row can disappear between the lookup and the write
        if !self.store.update_status(call.id, status).await? {
            return Err(ServiceError::NotFound);
        }

        info!("📞 Call {} status -> {}", call.id, status.as_str());

        Ok(())
    }

    pub async fn delete(&self, id: Uuid, caller: Uuid) -> ServiceResult<()> {
        let call = self.locate_owned(id, caller).await?;

        if !self.store.delete(call.id).await? {
            return Err(ServiceError::NotFound);
        }

        info!("🗑️  Call {} deleted by {}", call.id, caller);

        Ok(())
    }

    async fn locate_owned(&self, id: Uuid, caller: Uuid) -> ServiceResult<Call> {
        let Some(call) = self.store.get_by_id(id).await? else {
            return Err(ServiceError::NotFound);
        };

        if call.user_id != caller {
            debug!("Caller {} denied access to call {}", caller, id);
            return Err(ServiceError::Forbidden);
        }

        Ok(call)
    }
}
