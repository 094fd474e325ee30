//! Intent dispatch.
//!
//! Intents run strictly in list order against one accumulator and one
//! working copy of the params. A failing intent aborts the dispatch; the
//! error carries the intent list and the caller's params.

use super::types::{parse_intents, BuiltTransaction, Intent};
use crate::address::SuiAddress;
use crate::builder::calls::{self, MoveContext};
use crate::builder::evm;
use crate::codegen::{render_pool_token_factory, render_token_factory, PoolTokenTemplate, TokenTemplate};
use crate::coin::coin_metadata;
use crate::compiler::{GeneratedContractArtifact, PackageCompiler};
use crate::error::{AssemblyError, IntentError, StepError};
use crate::network::{EvmProfile, NetworkRegistry, ResolvedNetwork, DEFAULT_NETWORK};
use crate::params::ParamBag;
use crate::transaction::{ContractTransaction, TransactionAccumulator};
use crate::validation::{
    validate_add_liquidity_params, validate_metadata_params, validate_mint_params,
    validate_pool_amounts, validate_pool_only_params, validate_recipient,
    validate_token_and_pool_params, validate_token_params, TokenParams,
};
use tracing::{error, info};

/// Build one transaction from an ordered intent list.
///
/// Check order: network, empty list, intent tags. All tags are parsed before
/// the first intent runs, so an unknown tag never reaches the compiler.
///
/// # Example
///
/// ```
/// use wasm_intent_builder::{build_transaction, NetworkRegistry, ParamBag, PackageCompiler};
/// # use wasm_intent_builder::{CompiledPackage, PackageSource, BuildError};
/// # struct NoCompiler;
/// # impl PackageCompiler for NoCompiler {
/// #     fn compile(&self, _: &PackageSource) -> Result<CompiledPackage, BuildError> {
/// #         Err(BuildError::Callback("no compiler".to_string()))
/// #     }
/// # }
/// let params = ParamBag::new()
///     .with("treasury_cap", "0x7ca9")
///     .with("amount", "1000")
///     .with("recipient", "0xa11ce");
/// let tx = build_transaction(&["mint_token"], &params, None, &NetworkRegistry::builtin(), &NoCompiler)
///     .unwrap();
/// assert_eq!(tx.as_accumulated().unwrap().commands().len(), 1);
/// ```
pub fn build_transaction<S: AsRef<str>>(
    intents: &[S],
    params: &ParamBag,
    network: Option<&str>,
    registry: &NetworkRegistry,
    compiler: &dyn PackageCompiler,
) -> Result<BuiltTransaction, IntentError> {
    let network = registry.resolve(network.unwrap_or(DEFAULT_NETWORK))?;
    if intents.is_empty() {
        return Err(IntentError::EmptyIntentList);
    }
    let parsed = parse_intents(intents)?;

    let mut dispatch = Dispatch {
        network,
        compiler,
        params: params.clone(),
        tx: TransactionAccumulator::new(),
    };

    for (position, intent) in parsed.iter().enumerate() {
        info!(
            intent = %intent,
            position,
            network = %dispatch.network.id,
            "Processing intent"
        );
        match dispatch.apply(*intent) {
            Ok(Step::Continue) => {}
            Ok(Step::Done(call)) => {
                if position + 1 < parsed.len() {
                    info!(
                        intent = %intent,
                        skipped = parsed.len() - position - 1,
                        "Terminal intent returned early"
                    );
                }
                return Ok(BuiltTransaction::Contract(call));
            }
            Err(source) => {
                error!(intent = %intent, error = %source, "Error building transaction");
                return Err(IntentError::TransactionBuildFailed {
                    source,
                    intents: intents.iter().map(|i| i.as_ref().to_string()).collect(),
                    params: Box::new(params.clone()),
                });
            }
        }
    }

    Ok(BuiltTransaction::Accumulated(dispatch.tx))
}

enum Step {
    Continue,
    /// Terminal EVM call; stop processing
    Done(ContractTransaction),
}

struct Dispatch<'a> {
    network: ResolvedNetwork,
    compiler: &'a dyn PackageCompiler,
    /// Working copy; only `propagate_token` writes to it
    params: ParamBag,
    tx: TransactionAccumulator,
}

impl Dispatch<'_> {
    fn apply(&mut self, intent: Intent) -> Result<Step, StepError> {
        match intent {
            Intent::CreateToken => self.create_token()?,
            Intent::CreatePool => self.create_pool()?,
            Intent::CreateTokenAndPool => self.create_token_and_pool()?,
            Intent::CreateTestTokenAndPool => self.create_test_token_and_pool()?,
            Intent::MintToken => self.mint_token()?,
            Intent::AddLiquidity => self.add_liquidity()?,
            Intent::SetTokenMetadata => self.set_token_metadata()?,
            Intent::EvmCreateToken => {
                return Ok(Step::Done(evm::compose_create_token(
                    self.evm_profile()?,
                    &self.params,
                )?))
            }
            Intent::EvmMintToken => {
                let call = evm::compose_mint_token(self.evm_profile()?, &self.params)?;
                self.tx.push_contract_call(call);
            }
            Intent::EvmCreatePool => {
                return Ok(Step::Done(evm::compose_create_pool(
                    self.evm_profile()?,
                    &self.params,
                )?))
            }
        }
        Ok(Step::Continue)
    }

    fn move_context(&self) -> Result<MoveContext, AssemblyError> {
        let profile =
            self.network
                .profile
                .move_profile()
                .ok_or_else(|| AssemblyError::MissingChainProfile {
                    network: self.network.id.clone(),
                    chain: "move",
                })?;
        MoveContext::from_profile(profile)
    }

    fn evm_profile(&self) -> Result<&EvmProfile, AssemblyError> {
        self.network
            .profile
            .evm_profile()
            .ok_or_else(|| AssemblyError::MissingChainProfile {
                network: self.network.id.clone(),
                chain: "evm",
            })
    }

    fn coin_b_type(&self) -> Option<String> {
        self.params
            .get_any(&["coin_b_type", "coin_type_b"])
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    /// Expose a freshly created token as coin A to later intents.
    fn propagate_token(&mut self, token: &TokenParams) {
        self.params.set_if_absent("coin_a_symbol", token.symbol.as_str());
        self.params.set_if_absent("coin_a_decimals", token.decimals);
        self.params.set_if_absent("coin_a_url", token.icon_url.as_str());
    }

    fn recipient(&self) -> Result<SuiAddress, StepError> {
        let recipient = validate_recipient(&self.params)?;
        Ok(SuiAddress::parse_field(&recipient, "recipient")?)
    }

    fn create_token(&mut self) -> Result<(), StepError> {
        let token = validate_token_params(&self.params)?;
        let recipient = self.recipient()?;
        let source = render_token_factory(&token_template(&token))?;
        let artifact = GeneratedContractArtifact::build(self.compiler, source)?;
        calls::publish_and_transfer(&mut self.tx, artifact, recipient)?;
        info!(symbol = %token.symbol, "Token package publication prepared");
        self.propagate_token(&token);
        Ok(())
    }

    fn create_test_token_and_pool(&mut self) -> Result<(), StepError> {
        let params = validate_token_and_pool_params(&self.params)?;
        let recipient = self.recipient()?;
        let coin_b_type = match self.coin_b_type() {
            Some(t) => t,
            None => self.move_context()?.usdc_type,
        };
        let selected = coin_metadata(&coin_b_type);
        let template = PoolTokenTemplate {
            token: token_template(&params.token),
            initial_supply: params.token.initial_supply,
            protocol_config: SuiAddress::parse_field(
                &params.pool.protocol_config_id,
                "protocol config",
            )?,
            coin_b: SuiAddress::parse_field(&params.pool.coin_b, "coin B")?,
            coin_b_symbol: selected.symbol,
            coin_b_decimals: selected.decimals,
            tick_spacing: params.pool.tick_spacing,
            fee_basis_points: params.pool.fee_basis_points,
            current_sqrt_price: params.pool.current_sqrt_price,
        };
        let source = render_pool_token_factory(&template)?;
        let artifact = GeneratedContractArtifact::build(self.compiler, source)?;
        calls::publish_and_transfer(&mut self.tx, artifact, recipient)?;
        info!(
            symbol = %params.token.symbol,
            "Pool Token Factory package publication prepared"
        );
        Ok(())
    }

    fn create_token_and_pool(&mut self) -> Result<(), StepError> {
        let params = validate_token_and_pool_params(&self.params)?;
        let amounts = validate_pool_amounts(&self.params)?;
        let ctx = self.move_context()?;
        let coin_b_type = self.coin_b_type();
        calls::create_token_and_pool(&mut self.tx, &ctx, &params, coin_b_type.as_deref(), amounts)?;
        self.propagate_token(&params.token);
        Ok(())
    }

    fn create_pool(&mut self) -> Result<(), StepError> {
        let params = validate_pool_only_params(&self.params)?;
        let ctx = self.move_context()?;
        calls::create_pool_with_liquidity_only(&mut self.tx, &ctx, &params)?;
        Ok(())
    }

    fn mint_token(&mut self) -> Result<(), StepError> {
        let params = validate_mint_params(&self.params)?;
        let package = match &params.package_id {
            Some(id) => id.clone(),
            None => self.move_context()?.executor.to_hex_literal(),
        };
        calls::mint(&mut self.tx, &package, &params)?;
        Ok(())
    }

    fn add_liquidity(&mut self) -> Result<(), StepError> {
        let params = validate_add_liquidity_params(&self.params)?;
        let ctx = self.move_context()?;
        calls::add_liquidity(&mut self.tx, &ctx, &params)?;
        Ok(())
    }

    fn set_token_metadata(&mut self) -> Result<(), StepError> {
        let params = validate_metadata_params(&self.params)?;
        calls::set_metadata(&mut self.tx, &params)?;
        Ok(())
    }
}

fn token_template(token: &TokenParams) -> TokenTemplate {
    TokenTemplate {
        name: token.name.clone(),
        symbol: token.symbol.clone(),
        decimals: token.decimals,
        description: token.description.clone(),
    }
}
