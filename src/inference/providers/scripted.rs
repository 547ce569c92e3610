//! Offline backend. Waits, then answers every request with the same
//! login-module analysis and test-case suite. Good for demos and for
//! running the terminal UI without an API key.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::core::config::DEFAULT_SCRIPTED_LATENCY_MS;
use crate::core::turn::Artifact;
use crate::inference::{GeneratedTurn, GenerationError, GenerationProvider, GenerationRequest};

pub const SCRIPTED_ARTIFACT_TITLE: &str = "Login Module Test Cases";

const REPLY: &str = "I've analyzed your requirement document and generated comprehensive test cases. \
    The test cases cover login functionality, input validation, error handling, and security scenarios.";

const LOGIN_SUITE: &str = "**Test Case Suite: Login Module Analysis**

**Test Case 1: Valid Login Functionality**
- **Objective**: Verify successful login with valid credentials
- **Prerequisites**: User account exists in system
- **Steps**:
  1. Navigate to login page
  2. Enter valid username
  3. Enter valid password
  4. Click login button
- **Expected Result**: User is redirected to dashboard
- **Priority**: High

**Test Case 2: Invalid Credentials**
- **Objective**: Verify error handling for invalid credentials
- **Prerequisites**: Login page is accessible
- **Steps**:
  1. Navigate to login page
  2. Enter invalid username or password
  3. Click login button
- **Expected Result**: Error message displayed
- **Priority**: High

**Test Case 3: Empty Field Validation**
- **Objective**: Verify required field validation
- **Prerequisites**: Login page is accessible
- **Steps**:
  1. Navigate to login page
  2. Leave username field empty
  3. Click login button
- **Expected Result**: Validation error displayed
- **Priority**: Medium

**Test Case 4: Password Security**
- **Objective**: Verify password field is masked
- **Prerequisites**: Login page is accessible
- **Steps**:
  1. Navigate to login page
  2. Enter password in password field
- **Expected Result**: Password characters are masked
- **Priority**: Medium

**Test Case 5: Session Management**
- **Objective**: Verify session timeout handling
- **Prerequisites**: User is logged in
- **Steps**:
  1. Login successfully
  2. Wait for session timeout
  3. Attempt to access protected resource
- **Expected Result**: User is redirected to login
- **Priority**: High";

pub struct ScriptedProvider {
    latency: Duration,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_SCRIPTED_LATENCY_MS))
    }
}

impl ScriptedProvider {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedTurn, GenerationError> {
        debug!(
            "Scripted reply for turn {} after {:?}",
            request.user_turn.id(),
            self.latency
        );
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let content = match request.user_turn.attachment() {
            Some(attachment) => format!("{REPLY}\n\nSource document: {}", attachment.name),
            None => REPLY.to_string(),
        };
        Ok(GeneratedTurn::with_artifact(
            content,
            Artifact::new(SCRIPTED_ARTIFACT_TITLE, LOGIN_SUITE),
        ))
    }
}
