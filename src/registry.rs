//! Registry access layer.
//!
//! The on-chain contest registry is the sole owner of contest and participant
//! state; this module is the only place that talks to it. [`Registry`] is the
//! seam the rest of the service is built against, so components take an
//! explicitly constructed client instead of reaching for process-wide state,
//! and tests can substitute an in-memory double.
//!
//! Transport and RPC failure signals are classified into the service taxonomy
//! here and nowhere else: user-rejection codes become `UserCancelled`, funding
//! errors become `InsufficientFunds`, reverts keep the registry's raw reason
//! in `RegistryRejected`, and anything transport-shaped becomes
//! `NetworkUnavailable`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use secp256k1::SecretKey;
use web3::api::Eth;
use web3::contract::tokens::Detokenize;
use web3::contract::{Contract, Error as ContractError, Options};
use web3::ethabi::{RawLog, Token};
use web3::transports::Http;
use web3::types::{Address, TransactionReceipt, U256};

use crate::config::ChainConfig;
use crate::error::{Result, ServiceError};
use crate::types::{Contest, CreatedContest, NewContest, TxOutcome};
use crate::util::parse_address;

const CONTEST_REGISTRY_ABI: &[u8] = include_bytes!("../abi/contest_registry.json");

/// Receipts are awaited with a single confirmation before a mutation is
/// reported back; durability beyond that is the caller's concern.
const RECEIPT_CONFIRMATIONS: usize = 1;

/// EIP-1193 code a wallet provider returns when the user rejects signing.
const RPC_USER_REJECTED: i64 = 4001;

/// Query and mutate interface over the contest registry.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Authoritative number of contests ever created; valid ids are 1..=count.
    async fn contest_count(&self) -> Result<u64>;
    async fn contest(&self, id: u64) -> Result<Contest>;
    async fn participants(&self, id: u64) -> Result<Vec<Address>>;
    async fn is_participant(&self, id: u64, address: Address) -> Result<bool>;
    /// Submit a join, transferring exactly `stake` as call value. The registry
    /// itself re-checks the amount; it is not re-validated here.
    async fn join(&self, id: u64, stake: U256, signer: &SecretKey) -> Result<TxOutcome>;
    async fn create_contest(&self, params: &NewContest, signer: &SecretKey)
        -> Result<CreatedContest>;
    async fn distribute_rewards(
        &self,
        id: u64,
        winners: [Address; 3],
        signer: &SecretKey,
    ) -> Result<TxOutcome>;
}

/// `Registry` implementation over an EVM JSON-RPC endpoint.
pub struct EvmRegistry {
    eth: Eth<Http>,
    contract: Contract<Http>,
    gas: u64,
    gas_price: Option<u64>,
}

impl EvmRegistry {
    pub fn connect(chain: &ChainConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(chain.request_timeout_secs))
            .build()
            .context("build registry HTTP client")?;
        let url = Url::parse(&chain.endpoint).context("parse registry endpoint")?;
        let transport = Http::with_client(client, url);
        let web3 = web3::Web3::new(transport);
        let eth = web3.eth();
        let address = parse_address(&chain.contract_address)?;
        let contract = Contract::from_json(eth.clone(), address, CONTEST_REGISTRY_ABI)
            .context("parse registry ABI")?;
        Ok(Self {
            eth,
            contract,
            gas: chain.gas_limit,
            gas_price: chain.gas_price,
        })
    }

    /// Chain id reported by the node, for a startup sanity check against the
    /// configured network.
    pub async fn chain_id(&self) -> Result<u64> {
        let id = self.eth.chain_id().await.map_err(classify_api)?;
        Ok(id.low_u64())
    }

    fn call_options(&self, value: Option<U256>) -> Options {
        Options {
            gas: Some(self.gas.into()),
            gas_price: self.gas_price.map(Into::into),
            value,
            ..Options::default()
        }
    }
}

#[async_trait]
impl Registry for EvmRegistry {
    async fn contest_count(&self) -> Result<u64> {
        let count: U256 = self
            .contract
            .query("contestCount", (), None::<Address>, Options::default(), None)
            .await
            .map_err(classify_contract)?;
        Ok(count.low_u64())
    }

    async fn contest(&self, id: u64) -> Result<Contest> {
        let data: ContestData = self
            .contract
            .query(
                "getContest",
                U256::from(id),
                None::<Address>,
                Options::default(),
                None,
            )
            .await
            .map_err(|e| not_found_on_bad_data(id, e))?;
        let contest = data.into_contest(id);
        if contest.is_zero_shape() {
            return Err(ServiceError::NotFound(id));
        }
        Ok(contest)
    }

    async fn participants(&self, id: u64) -> Result<Vec<Address>> {
        self.contract
            .query(
                "getParticipants",
                U256::from(id),
                None::<Address>,
                Options::default(),
                None,
            )
            .await
            .map_err(|e| not_found_on_bad_data(id, e))
    }

    async fn is_participant(&self, id: u64, address: Address) -> Result<bool> {
        self.contract
            .query(
                "isParticipant",
                (U256::from(id), address),
                None::<Address>,
                Options::default(),
                None,
            )
            .await
            .map_err(|e| not_found_on_bad_data(id, e))
    }

    async fn join(&self, id: u64, stake: U256, signer: &SecretKey) -> Result<TxOutcome> {
        let receipt = self
            .contract
            .signed_call_with_confirmations(
                "joinContest",
                U256::from(id),
                self.call_options(Some(stake)),
                RECEIPT_CONFIRMATIONS,
                signer,
            )
            .await
            .map_err(classify_api)?;
        Ok(outcome_of(&receipt))
    }

    async fn create_contest(
        &self,
        params: &NewContest,
        signer: &SecretKey,
    ) -> Result<CreatedContest> {
        let receipt = self
            .contract
            .signed_call_with_confirmations(
                "createContest",
                (
                    params.name.clone(),
                    params.stake_amount,
                    U256::from(params.start_time),
                    U256::from(params.end_time),
                    U256::from(params.max_participants),
                    U256::from(params.min_participants),
                ),
                self.call_options(None),
                RECEIPT_CONFIRMATIONS,
                signer,
            )
            .await
            .map_err(classify_api)?;
        let outcome = outcome_of(&receipt);
        Ok(CreatedContest {
            contest_id: self.parse_created_id(&receipt),
            tx_hash: outcome.tx_hash,
            confirmed: outcome.confirmed,
        })
    }

    async fn distribute_rewards(
        &self,
        id: u64,
        winners: [Address; 3],
        signer: &SecretKey,
    ) -> Result<TxOutcome> {
        let receipt = self
            .contract
            .signed_call_with_confirmations(
                "distributeRewards",
                (U256::from(id), winners[0], winners[1], winners[2]),
                self.call_options(None),
                RECEIPT_CONFIRMATIONS,
                signer,
            )
            .await
            .map_err(classify_api)?;
        Ok(outcome_of(&receipt))
    }
}

impl EvmRegistry {
    /// Pull the assigned contest id out of the `ContestCreated` event, if the
    /// receipt carries one. Unrelated logs are skipped.
    fn parse_created_id(&self, receipt: &TransactionReceipt) -> Option<u64> {
        let event = self.contract.abi().event("ContestCreated").ok()?;
        for log in &receipt.logs {
            let raw = RawLog {
                topics: log.topics.clone(),
                data: log.data.0.clone(),
            };
            let Ok(parsed) = event.parse_log(raw) else {
                continue;
            };
            for param in parsed.params {
                if param.name == "contestId" {
                    if let Token::Uint(value) = param.value {
                        return Some(value.low_u64());
                    }
                }
            }
        }
        None
    }
}

fn outcome_of(receipt: &TransactionReceipt) -> TxOutcome {
    TxOutcome {
        tx_hash: receipt.transaction_hash,
        confirmed: receipt.status == Some(1.into()),
    }
}

// ---------------------------------------------------------------------------
// Failure classification (the single boundary)
// ---------------------------------------------------------------------------

/// Read calls that fail to decode hit ids the registry never assigned: the
/// node answered with empty or malformed return data rather than a contest.
fn not_found_on_bad_data(id: u64, err: ContractError) -> ServiceError {
    match err {
        ContractError::InvalidOutputType(_) | ContractError::Abi(_) => ServiceError::NotFound(id),
        ContractError::Api(api) => match classify_api(api) {
            ServiceError::RegistryRejected(_) => ServiceError::NotFound(id),
            other => other,
        },
        other => ServiceError::RegistryRejected(other.to_string()),
    }
}

fn classify_contract(err: ContractError) -> ServiceError {
    match err {
        ContractError::Api(api) => classify_api(api),
        other => ServiceError::RegistryRejected(other.to_string()),
    }
}

fn classify_api(err: web3::Error) -> ServiceError {
    match err {
        web3::Error::Transport(t) => ServiceError::NetworkUnavailable(t.to_string()),
        web3::Error::Io(e) => ServiceError::NetworkUnavailable(e.to_string()),
        web3::Error::Unreachable => {
            ServiceError::NetworkUnavailable("endpoint unreachable".to_string())
        }
        web3::Error::InvalidResponse(m) => ServiceError::NetworkUnavailable(m),
        web3::Error::Rpc(e) => classify_rpc(e.code.code(), &e.message),
        other => ServiceError::RegistryRejected(other.to_string()),
    }
}

fn classify_rpc(code: i64, message: &str) -> ServiceError {
    let lower = message.to_ascii_lowercase();
    if code == RPC_USER_REJECTED || lower.contains("user denied") || lower.contains("user rejected")
    {
        return ServiceError::UserCancelled;
    }
    if lower.contains("insufficient funds") {
        return ServiceError::InsufficientFunds;
    }
    if let Some(rest) = lower
        .find("execution reverted")
        .map(|at| &message[at + "execution reverted".len()..])
    {
        let reason = rest.trim_start_matches(':').trim();
        if reason.is_empty() {
            return ServiceError::RegistryRejected(message.to_string());
        }
        return ServiceError::RegistryRejected(reason.to_string());
    }
    ServiceError::RegistryRejected(message.to_string())
}

// ---------------------------------------------------------------------------
// ABI decoding
// ---------------------------------------------------------------------------

/// The 7-field `getContest` return value. Some registries flatten the outputs,
/// others wrap them in a single tuple; both shapes are accepted.
struct ContestData {
    name: String,
    stake_amount: U256,
    start_time: u64,
    end_time: u64,
    max_participants: u32,
    min_participants: u32,
    rewards_distributed: bool,
}

impl ContestData {
    fn decode(tokens: Vec<Token>) -> std::result::Result<Self, ContractError> {
        if tokens.len() != 7 {
            return Err(ContractError::InvalidOutputType(format!(
                "expected 7 contest fields, got {}",
                tokens.len()
            )));
        }
        let mut it = tokens.into_iter();
        let name = take_string(&mut it, "name")?;
        let stake_amount = take_uint(&mut it, "stakeAmount")?;
        let start_time = take_u64(&mut it, "startTime")?;
        let end_time = take_u64(&mut it, "endTime")?;
        let max_participants = take_u32(&mut it, "maxParticipants")?;
        let min_participants = take_u32(&mut it, "minParticipants")?;
        let rewards_distributed = take_bool(&mut it, "rewardsDistributed")?;
        Ok(Self {
            name,
            stake_amount,
            start_time,
            end_time,
            max_participants,
            min_participants,
            rewards_distributed,
        })
    }

    fn into_contest(self, id: u64) -> Contest {
        Contest {
            id,
            name: self.name,
            stake_amount: self.stake_amount,
            start_time: self.start_time,
            end_time: self.end_time,
            max_participants: self.max_participants,
            min_participants: self.min_participants,
            rewards_distributed: self.rewards_distributed,
        }
    }
}

impl Detokenize for ContestData {
    fn from_tokens(tokens: Vec<Token>) -> std::result::Result<Self, ContractError> {
        match tokens.len() {
            1 => match tokens.into_iter().next() {
                Some(Token::Tuple(inner)) | Some(Token::Array(inner)) => Self::decode(inner),
                other => Err(ContractError::InvalidOutputType(format!(
                    "expected contest tuple, got {:?}",
                    other
                ))),
            },
            _ => Self::decode(tokens),
        }
    }
}

fn bad_field(field: &str, token: Option<Token>) -> ContractError {
    ContractError::InvalidOutputType(format!("unexpected token for {}: {:?}", field, token))
}

fn take_string(
    it: &mut impl Iterator<Item = Token>,
    field: &str,
) -> std::result::Result<String, ContractError> {
    let token = it.next();
    token
        .clone()
        .and_then(Token::into_string)
        .ok_or_else(|| bad_field(field, token))
}

fn take_uint(
    it: &mut impl Iterator<Item = Token>,
    field: &str,
) -> std::result::Result<U256, ContractError> {
    let token = it.next();
    token
        .clone()
        .and_then(Token::into_uint)
        .ok_or_else(|| bad_field(field, token))
}

fn take_u64(
    it: &mut impl Iterator<Item = Token>,
    field: &str,
) -> std::result::Result<u64, ContractError> {
    let value = take_uint(it, field)?;
    u64::try_from(value)
        .map_err(|_| ContractError::InvalidOutputType(format!("{} out of u64 range", field)))
}

fn take_u32(
    it: &mut impl Iterator<Item = Token>,
    field: &str,
) -> std::result::Result<u32, ContractError> {
    let value = take_uint(it, field)?;
    u32::try_from(value)
        .map_err(|_| ContractError::InvalidOutputType(format!("{} out of u32 range", field)))
}

fn take_bool(
    it: &mut impl Iterator<Item = Token>,
    field: &str,
) -> std::result::Result<bool, ContractError> {
    let token = it.next();
    token
        .clone()
        .and_then(Token::into_bool)
        .ok_or_else(|| bad_field(field, token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contest_tokens() -> Vec<Token> {
        vec![
            Token::String("Push-up Challenge".into()),
            Token::Uint(U256::exp10(17)),
            Token::Uint(U256::from(1_000u64)),
            Token::Uint(U256::from(2_000u64)),
            Token::Uint(U256::from(100u64)),
            Token::Uint(U256::from(5u64)),
            Token::Bool(false),
        ]
    }

    #[test]
    fn decodes_flat_outputs() {
        let data = ContestData::from_tokens(contest_tokens()).unwrap();
        let contest = data.into_contest(4);
        assert_eq!(contest.id, 4);
        assert_eq!(contest.name, "Push-up Challenge");
        assert_eq!(contest.stake_amount, U256::exp10(17));
        assert_eq!(contest.max_participants, 100);
        assert!(!contest.rewards_distributed);
    }

    #[test]
    fn decodes_tuple_wrapped_outputs() {
        let data = ContestData::from_tokens(vec![Token::Tuple(contest_tokens())]).unwrap();
        assert_eq!(data.into_contest(1).end_time, 2_000);
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(ContestData::from_tokens(vec![Token::Bool(true), Token::Bool(false)]).is_err());
    }

    #[test]
    fn rejects_wrong_field_type() {
        let mut tokens = contest_tokens();
        tokens[1] = Token::Bool(true);
        assert!(ContestData::from_tokens(tokens).is_err());
    }

    #[test]
    fn rpc_user_rejection_maps_to_cancelled() {
        assert!(matches!(
            classify_rpc(RPC_USER_REJECTED, "User rejected the request."),
            ServiceError::UserCancelled
        ));
        assert!(matches!(
            classify_rpc(-32603, "MetaMask Tx Signature: User denied transaction signature."),
            ServiceError::UserCancelled
        ));
    }

    #[test]
    fn rpc_funding_errors_map_to_insufficient_funds() {
        assert!(matches!(
            classify_rpc(-32000, "insufficient funds for gas * price + value"),
            ServiceError::InsufficientFunds
        ));
    }

    #[test]
    fn rpc_reverts_keep_the_registry_reason() {
        match classify_rpc(3, "execution reverted: Contest is full") {
            ServiceError::RegistryRejected(reason) => assert_eq!(reason, "Contest is full"),
            other => panic!("unexpected classification: {:?}", other),
        }
        match classify_rpc(3, "execution reverted") {
            ServiceError::RegistryRejected(reason) => assert_eq!(reason, "execution reverted"),
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn unknown_rpc_errors_keep_the_raw_message() {
        match classify_rpc(-32601, "method not found") {
            ServiceError::RegistryRejected(reason) => assert_eq!(reason, "method not found"),
            other => panic!("unexpected classification: {:?}", other),
        }
    }
}
