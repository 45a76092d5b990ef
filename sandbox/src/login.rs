// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Login handlers, declared with the attribute markers.

use crate::keys::login;
use relay_sdk::prelude::*;
use std::fmt;

/// Credentials typed into the login form.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub pin: u32,
}

#[derive(Debug)]
pub enum LoginError {
    EmptyUser,
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUser => write!(f, "user name is empty"),
        }
    }
}

#[request(login::ECHO_REQUEST)]
fn echo(ctx: &HandlerContext<'_>, text: &String) {
    ctx.publish(login::ECHO_EVENT, Payload::new(text.clone()));
}

#[request(login::SUBMIT_REQUEST)]
fn submit(ctx: &HandlerContext<'_>, credentials: &Credentials) -> Result<(), LoginError> {
    if credentials.user.trim().is_empty() {
        return Err(LoginError::EmptyUser);
    }
    if credentials.pin == 1234 {
        ctx.publish(login::ACCEPTED_EVENT, Payload::new(credentials.user.clone()));
    } else {
        ctx.publish(login::REJECTED_EVENT, Payload::new(credentials.user.clone()));
    }
    Ok(())
}

#[on_scope_enter]
fn client_started(ctx: &HandlerContext<'_>) {
    log::info!("Login ready in scope {}.", ctx.scope());
}
