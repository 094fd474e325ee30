//! Transaction outputs.
//!
//! [`TransactionAccumulator`] is a programmable transaction under
//! construction for the object chain: an input table plus an ordered list of
//! commands whose arguments index into the inputs or into earlier command
//! results. [`ContractTransaction`] is a populated, unsigned EVM call.

use crate::address::SuiAddress;
use crate::error::AssemblyError;
use alloy_primitives::{Address, Bytes, U256};
use base64::Engine;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Gas budget used for transactions that publish a package
pub const PUBLISH_GAS_BUDGET: u64 = 50_000_000;

// =============================================================================
// Arguments and inputs
// =============================================================================

/// Reference to a value available to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Argument {
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

/// A scalar argument tagged with the width of its destination parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PureValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    Bool(bool),
    Address(SuiAddress),
    String(String),
    Bytes(Vec<u8>),
}

impl PureValue {
    /// BCS encoding as the destination function expects it
    pub fn to_bcs(&self) -> Result<Vec<u8>, AssemblyError> {
        let encoded = match self {
            PureValue::U8(v) => bcs::to_bytes(v),
            PureValue::U16(v) => bcs::to_bytes(v),
            PureValue::U32(v) => bcs::to_bytes(v),
            PureValue::U64(v) => bcs::to_bytes(v),
            PureValue::U128(v) => bcs::to_bytes(v),
            PureValue::Bool(v) => bcs::to_bytes(v),
            PureValue::Address(a) => bcs::to_bytes(a.as_bytes()),
            PureValue::String(s) => bcs::to_bytes(s),
            PureValue::Bytes(b) => bcs::to_bytes(b),
        };
        encoded.map_err(|e| AssemblyError::Encoding(e.to_string()))
    }
}

/// Transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CallArg {
    Pure {
        #[serde(serialize_with = "base64_bytes")]
        bytes: Vec<u8>,
    },
    /// Object referenced by id only; version and digest are resolved by the
    /// signer before submission
    #[serde(rename_all = "camelCase")]
    UnresolvedObject { object_id: SuiAddress },
}

// =============================================================================
// Commands
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCall {
    pub package: SuiAddress,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Argument>,
}

impl MoveCall {
    /// `package::module::function` target string
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Command {
    MoveCall(Box<MoveCall>),
    TransferObjects {
        objects: Vec<Argument>,
        address: Argument,
    },
    SplitCoins {
        coin: Argument,
        amounts: Vec<Argument>,
    },
    Publish {
        #[serde(serialize_with = "base64_modules")]
        modules: Vec<Vec<u8>>,
        dependencies: Vec<SuiAddress>,
    },
}

// =============================================================================
// EVM contract transaction
// =============================================================================

/// Populated but unsigned EVM contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTransaction {
    pub to: Address,
    pub data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

// =============================================================================
// Accumulator
// =============================================================================

/// Object-chain transaction built incrementally by the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionAccumulator {
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
    gas_budget: Option<u64>,
    object_inputs: HashMap<SuiAddress, u16>,
    contract_calls: Vec<ContractTransaction>,
}

impl TransactionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inputs(&self) -> &[CallArg] {
        &self.inputs
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn gas_budget(&self) -> Option<u64> {
        self.gas_budget
    }

    /// EVM calls collected by non-terminal EVM intents
    pub fn contract_calls(&self) -> &[ContractTransaction] {
        &self.contract_calls
    }

    pub fn set_gas_budget(&mut self, budget: u64) {
        self.gas_budget = Some(budget);
    }

    fn next_index(len: usize, what: &str) -> Result<u16, AssemblyError> {
        u16::try_from(len)
            .map_err(|_| AssemblyError::Encoding(format!("too many {} in transaction", what)))
    }

    /// Add a pure input
    pub fn pure(&mut self, value: PureValue) -> Result<Argument, AssemblyError> {
        let bytes = value.to_bcs()?;
        let index = Self::next_index(self.inputs.len(), "inputs")?;
        self.inputs.push(CallArg::Pure { bytes });
        Ok(Argument::Input(index))
    }

    /// Add an object input. The same id always maps to the same input.
    pub fn object(&mut self, id: SuiAddress) -> Result<Argument, AssemblyError> {
        if let Some(index) = self.object_inputs.get(&id) {
            return Ok(Argument::Input(*index));
        }
        let index = Self::next_index(self.inputs.len(), "inputs")?;
        self.inputs.push(CallArg::UnresolvedObject { object_id: id });
        self.object_inputs.insert(id, index);
        Ok(Argument::Input(index))
    }

    fn command(&mut self, command: Command) -> Result<Argument, AssemblyError> {
        let index = Self::next_index(self.commands.len(), "commands")?;
        self.commands.push(command);
        Ok(Argument::Result(index))
    }

    pub fn move_call(&mut self, call: MoveCall) -> Result<Argument, AssemblyError> {
        self.command(Command::MoveCall(Box::new(call)))
    }

    /// Publish compiled modules; the result is the upgrade capability
    pub fn publish(
        &mut self,
        modules: Vec<Vec<u8>>,
        dependencies: Vec<SuiAddress>,
    ) -> Result<Argument, AssemblyError> {
        self.command(Command::Publish {
            modules,
            dependencies,
        })
    }

    pub fn transfer_objects(
        &mut self,
        objects: Vec<Argument>,
        address: Argument,
    ) -> Result<Argument, AssemblyError> {
        self.command(Command::TransferObjects { objects, address })
    }

    /// Split `amounts` off `coin`; each new coin is a nested result
    pub fn split_coins(
        &mut self,
        coin: Argument,
        amounts: Vec<Argument>,
    ) -> Result<Argument, AssemblyError> {
        self.command(Command::SplitCoins { coin, amounts })
    }

    pub fn push_contract_call(&mut self, call: ContractTransaction) {
        self.contract_calls.push(call);
    }

    /// JSON form accepted by the object chain SDK (`Transaction.from`)
    pub fn to_json(&self) -> Result<serde_json::Value, AssemblyError> {
        serde_json::to_value(self).map_err(|e| AssemblyError::Encoding(e.to_string()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionData<'a> {
    version: u8,
    /// Filled in by the signer
    sender: Option<SuiAddress>,
    expiration: Option<()>,
    gas_data: GasData,
    inputs: &'a [CallArg],
    commands: &'a [Command],
    #[serde(skip_serializing_if = "no_calls")]
    contract_calls: &'a [ContractTransaction],
}

/// Every key is present; the signer resolves price, owner and payment.
#[derive(Serialize)]
struct GasData {
    budget: Option<String>,
    price: Option<String>,
    owner: Option<SuiAddress>,
    payment: Option<Vec<()>>,
}

impl Serialize for TransactionAccumulator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TransactionData {
            version: 2,
            sender: None,
            expiration: None,
            gas_data: GasData {
                budget: self.gas_budget.map(|b| b.to_string()),
                price: None,
                owner: None,
                payment: None,
            },
            inputs: &self.inputs,
            commands: &self.commands,
            contract_calls: &self.contract_calls,
        }
        .serialize(serializer)
    }
}

fn no_calls(calls: &&[ContractTransaction]) -> bool {
    calls.is_empty()
}

fn base64_bytes<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
}

fn base64_modules<S: Serializer>(modules: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(
        modules
            .iter()
            .map(|m| base64::engine::general_purpose::STANDARD.encode(m)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn addr(s: &str) -> SuiAddress {
        s.parse().unwrap()
    }

    #[test]
    fn test_pure_widths() {
        assert_eq!(PureValue::U8(9).to_bcs().unwrap(), vec![9]);
        assert_eq!(PureValue::U32(60).to_bcs().unwrap(), vec![60, 0, 0, 0]);
        assert_eq!(PureValue::U64(1).to_bcs().unwrap().len(), 8);
        assert_eq!(PureValue::U128(1).to_bcs().unwrap().len(), 16);
        assert_eq!(PureValue::Address(addr("0x6")).to_bcs().unwrap().len(), 32);
        assert_eq!(
            PureValue::String("USDC".into()).to_bcs().unwrap(),
            vec![4, b'U', b'S', b'D', b'C']
        );
    }

    #[test]
    fn test_object_inputs_are_shared() {
        let mut tx = TransactionAccumulator::new();
        let clock = tx.object(addr("0x6")).unwrap();
        let amount = tx.pure(PureValue::U64(5)).unwrap();
        let again = tx.object(addr("0x6")).unwrap();
        assert_eq!(clock, Argument::Input(0));
        assert_eq!(amount, Argument::Input(1));
        assert_eq!(again, clock);
        assert_eq!(tx.inputs().len(), 2);
    }

    #[test]
    fn test_command_results_are_indexed() {
        let mut tx = TransactionAccumulator::new();
        let cap = tx.publish(vec![vec![1, 2, 3]], vec![addr("0x1"), addr("0x2")]).unwrap();
        let recipient = tx.pure(PureValue::Address(addr("0xa11ce"))).unwrap();
        let transfer = tx.transfer_objects(vec![cap], recipient).unwrap();
        assert_eq!(cap, Argument::Result(0));
        assert_eq!(transfer, Argument::Result(1));
    }

    #[test]
    fn test_json_shape() {
        let mut tx = TransactionAccumulator::new();
        tx.set_gas_budget(PUBLISH_GAS_BUDGET);
        let cap = tx.publish(vec![vec![0xde, 0xad]], vec![addr("0x2")]).unwrap();
        let recipient = tx.pure(PureValue::U8(1)).unwrap();
        tx.transfer_objects(vec![cap], recipient).unwrap();
        let coin = tx.object(addr("0xc01")).unwrap();
        tx.split_coins(coin, vec![recipient]).unwrap();

        let value = tx.to_json().unwrap();
        assert_eq!(value["version"], 2);
        assert_eq!(value["sender"], Value::Null);
        assert_eq!(value["expiration"], Value::Null);
        assert_eq!(
            value["gasData"],
            json!({ "budget": "50000000", "price": null, "owner": null, "payment": null })
        );
        assert_eq!(value["inputs"][0], json!({ "Pure": { "bytes": "AQ==" } }));
        assert_eq!(
            value["inputs"][1]["UnresolvedObject"]["objectId"],
            "0x0000000000000000000000000000000000000000000000000000000000000c01"
        );
        assert_eq!(value["commands"][0]["Publish"]["modules"], json!(["3q0="]));
        assert_eq!(
            value["commands"][1],
            json!({ "TransferObjects": { "objects": [{ "Result": 0 }], "address": { "Input": 0 } } })
        );
        assert_eq!(
            value["commands"][2]["SplitCoins"]["coin"],
            json!({ "Input": 1 })
        );
        assert!(value.get("contractCalls").is_none());
    }

    #[test]
    fn test_empty_transaction_keeps_every_key() {
        let value = TransactionAccumulator::new().to_json().unwrap();
        assert_eq!(
            value,
            json!({
                "version": 2,
                "sender": null,
                "expiration": null,
                "gasData": { "budget": null, "price": null, "owner": null, "payment": null },
                "inputs": [],
                "commands": []
            })
        );
    }

    #[test]
    fn test_nested_result_and_gas_coin_json() {
        assert_eq!(
            serde_json::to_value(Argument::NestedResult(1, 0)).unwrap(),
            json!({ "NestedResult": [1, 0] })
        );
        assert_eq!(serde_json::to_value(Argument::GasCoin).unwrap(), json!("GasCoin"));
    }
}
