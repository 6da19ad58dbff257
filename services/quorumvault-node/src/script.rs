//! Operation scripts replayed against a wallet engine.
//!
//! A script is a JSON array of operations tagged by `op`. Each operation
//! produces one [`Outcome`]; a failed operation does not stop the replay.

use anyhow::Context;
use quorumvault_authorization::{AuthorizationEngine, AuthorizationError, ErrorKind, InMemoryTreasury};
use quorumvault_core::{ActionId, Amount, Identity};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Deposit {
        from: Identity,
        amount: u64,
    },
    Submit {
        caller: Identity,
        target: Identity,
        amount: u64,
        /// Hex-encoded payload
        #[serde(default)]
        payload: String,
    },
    Confirm {
        caller: Identity,
        action_id: ActionId,
    },
    Revoke {
        caller: Identity,
        action_id: ActionId,
    },
    Execute {
        caller: Identity,
        action_id: ActionId,
    },
    Get {
        action_id: ActionId,
    },
    IsConfirmed {
        action_id: ActionId,
        owner: Identity,
    },
    Balance {
        #[serde(default)]
        of: Option<Identity>,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Deposit { .. } => "deposit",
            Operation::Submit { .. } => "submit",
            Operation::Confirm { .. } => "confirm",
            Operation::Revoke { .. } => "revoke",
            Operation::Execute { .. } => "execute",
            Operation::Get { .. } => "get",
            Operation::IsConfirmed { .. } => "is_confirmed",
            Operation::Balance { .. } => "balance",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

/// Result line printed for each operation
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Outcome {
    fn ok(op: &'static str, value: Value) -> Self {
        Self {
            op,
            ok: Some(value),
            error: None,
        }
    }

    fn failed(op: &'static str, kind: String, message: String) -> Self {
        Self {
            op,
            ok: None,
            error: Some(ErrorBody { kind, message }),
        }
    }

    fn from_auth(op: &'static str, err: AuthorizationError) -> Self {
        Self::failed(op, kind_name(err.kind()), err.to_string())
    }
}

fn kind_name(kind: ErrorKind) -> String {
    format!("{:?}", kind)
}

pub fn parse_script(raw: &str) -> anyhow::Result<Vec<Operation>> {
    serde_json::from_str(raw).context("script must be a JSON array of operations")
}

/// Apply one operation; only output encoding failures are hard errors
pub fn apply(
    engine: &AuthorizationEngine<InMemoryTreasury>,
    operation: Operation,
) -> anyhow::Result<Outcome> {
    let op = operation.name();
    let outcome = match operation {
        Operation::Deposit { from, amount } => match engine.effect().deposit(&from, Amount::from(amount)) {
            Ok(vault_balance) => Outcome::ok(
                op,
                json!({
                    "vault_balance": serde_json::to_value(vault_balance)
                        .context("balance does not fit JSON output")?
                }),
            ),
            Err(err) => Outcome::failed(op, "TransferError".to_string(), err.to_string()),
        },
        Operation::Submit {
            caller,
            target,
            amount,
            payload,
        } => {
            let payload = match hex::decode(payload.trim_start_matches("0x")) {
                Ok(bytes) => bytes,
                Err(err) => {
                    return Ok(Outcome::failed(op, "InvalidPayload".to_string(), err.to_string()))
                }
            };
            action_id_outcome(op, engine.submit(&caller, target, Amount::from(amount), payload))
        }
        Operation::Confirm { caller, action_id } => {
            action_id_outcome(op, engine.confirm(action_id, &caller))
        }
        Operation::Revoke { caller, action_id } => {
            action_id_outcome(op, engine.revoke(action_id, &caller))
        }
        Operation::Execute { caller, action_id } => {
            action_id_outcome(op, engine.execute(action_id, &caller))
        }
        Operation::Get { action_id } => match engine.get(action_id) {
            Ok(action) => Outcome::ok(
                op,
                serde_json::to_value(&action).context("action does not fit JSON output")?,
            ),
            Err(err) => Outcome::from_auth(op, err),
        },
        Operation::IsConfirmed { action_id, owner } => match engine.is_confirmed(action_id, &owner) {
            Ok(confirmed) => Outcome::ok(op, Value::Bool(confirmed)),
            Err(err) => Outcome::from_auth(op, err),
        },
        Operation::Balance { of } => {
            let balance = match &of {
                Some(identity) => engine.effect().balance_of(identity),
                None => engine.effect().vault_balance(),
            };
            Outcome::ok(
                op,
                serde_json::to_value(balance).context("balance does not fit JSON output")?,
            )
        }
    };
    Ok(outcome)
}

fn action_id_outcome(op: &'static str, result: Result<ActionId, AuthorizationError>) -> Outcome {
    match result {
        Ok(action_id) => Outcome::ok(op, json!({ "action_id": action_id })),
        Err(err) => Outcome::from_auth(op, err),
    }
}
