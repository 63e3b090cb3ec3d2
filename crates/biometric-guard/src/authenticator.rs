//! Platform biometric prompt service.

use crate::{BiometricError, BiometricResult, BiometricType, PromptRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Capability queries and the user-presence challenge.
#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    async fn has_hardware(&self) -> BiometricResult<bool>;

    async fn is_enrolled(&self) -> BiometricResult<bool>;

    async fn supported_types(&self) -> BiometricResult<Vec<BiometricType>>;

    /// Run one challenge. `Ok(false)` means the user failed or cancelled.
    async fn authenticate(&self, request: &PromptRequest) -> BiometricResult<bool>;
}

/// Host without biometric hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableAuthenticator;

#[async_trait]
impl BiometricAuthenticator for UnavailableAuthenticator {
    async fn has_hardware(&self) -> BiometricResult<bool> {
        Ok(false)
    }

    async fn is_enrolled(&self) -> BiometricResult<bool> {
        Ok(false)
    }

    async fn supported_types(&self) -> BiometricResult<Vec<BiometricType>> {
        Ok(Vec::new())
    }

    async fn authenticate(&self, _request: &PromptRequest) -> BiometricResult<bool> {
        Err(BiometricError::Unavailable)
    }
}

#[derive(Debug)]
struct SimulatedDevice {
    has_hardware: bool,
    is_enrolled: bool,
    types: Vec<BiometricType>,
    outcomes: VecDeque<bool>,
    default_outcome: bool,
    failing: bool,
    prompts: Vec<PromptRequest>,
}

/// Software device whose state can be changed at runtime.
///
/// Challenge outcomes are taken from a queue, falling back to a default.
/// Every prompt shown is recorded.
#[derive(Debug)]
pub struct SimulatedAuthenticator {
    device: Mutex<SimulatedDevice>,
}

impl SimulatedAuthenticator {
    /// Device with hardware, enrolled with the given modalities, passing every challenge.
    pub fn enrolled(types: Vec<BiometricType>) -> Self {
        Self {
            device: Mutex::new(SimulatedDevice {
                has_hardware: true,
                is_enrolled: !types.is_empty(),
                types,
                outcomes: VecDeque::new(),
                default_outcome: true,
                failing: false,
                prompts: Vec::new(),
            }),
        }
    }

    /// Change the enrolled modalities. An empty list un-enrolls the device.
    pub fn set_enrollment(&self, types: Vec<BiometricType>) {
        let mut device = self.device.lock();
        device.is_enrolled = !types.is_empty();
        device.types = types;
    }

    pub fn set_hardware(&self, has_hardware: bool) {
        self.device.lock().has_hardware = has_hardware;
    }

    /// Queue the outcome of the next challenge.
    pub fn push_outcome(&self, success: bool) {
        self.device.lock().outcomes.push_back(success);
    }

    pub fn set_default_outcome(&self, success: bool) {
        self.device.lock().default_outcome = success;
    }

    /// Make every platform call fail.
    pub fn set_failing(&self, failing: bool) {
        self.device.lock().failing = failing;
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> Vec<PromptRequest> {
        self.device.lock().prompts.clone()
    }

    fn check(&self) -> BiometricResult<()> {
        if self.device.lock().failing {
            return Err(BiometricError::Platform("simulated device failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BiometricAuthenticator for SimulatedAuthenticator {
    async fn has_hardware(&self) -> BiometricResult<bool> {
        self.check()?;
        Ok(self.device.lock().has_hardware)
    }

    async fn is_enrolled(&self) -> BiometricResult<bool> {
        self.check()?;
        Ok(self.device.lock().is_enrolled)
    }

    async fn supported_types(&self) -> BiometricResult<Vec<BiometricType>> {
        self.check()?;
        Ok(self.device.lock().types.clone())
    }

    async fn authenticate(&self, request: &PromptRequest) -> BiometricResult<bool> {
        self.check()?;
        let mut device = self.device.lock();
        device.prompts.push(request.clone());
        let default = device.default_outcome;
        Ok(device.outcomes.pop_front().unwrap_or(default))
    }
}
