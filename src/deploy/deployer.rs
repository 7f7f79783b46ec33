use std::sync::Arc;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};

use super::manifest::RoleAddresses;
use crate::chain::{Executor, TxRequest};
use crate::contracts::{Contract, Contracts, SendOptions, codec};
use crate::error::{Error, Result};

/// Knobs for a deployment run. Prices are 18-decimal fixed point, the
/// denomination the feeds are poked in.
#[derive(Clone, Debug)]
pub struct DeployOptions {
    pub with_market: bool,
    pub smoke_test: bool,
    pub pip_start_price: U256,
    pub pep_start_price: U256,
    pub market_closing_time: u64,
    pub smoke_collateral: U256,
    pub smoke_draw: U256,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            with_market: false,
            smoke_test: false,
            pip_start_price: wad(400),
            pep_start_price: wad(50),
            // 2100-01-01: a market lifetime no run will outlive.
            market_closing_time: 4_102_444_800,
            smoke_collateral: wad(1),
            smoke_draw: wad(10),
        }
    }
}

fn wad(units: u64) -> U256 {
    U256::from(units) * U256::from(10).pow(U256::from(18))
}

fn addr(contract: &Contract) -> DynSolValue {
    DynSolValue::Address(contract.address())
}

struct Fabs {
    gem_fab: Contract,
    vox_fab: Contract,
    tub_fab: Contract,
    tap_fab: Contract,
    top_fab: Contract,
    mom_fab: Contract,
    dad_fab: Contract,
}

struct Tokens {
    gem: Contract,
    gov: Contract,
}

struct Feeds {
    pip: Contract,
    pep: Contract,
}

struct Admin {
    adm: Contract,
    pit: Contract,
}

/// Addresses of the contracts DaiFab created internally, read back off its
/// public getters once wiring is complete.
struct System {
    sai: Address,
    sin: Address,
    skr: Address,
    dad: Address,
    mom: Address,
    vox: Address,
    tub: Address,
    tap: Address,
    top: Address,
}

/// The fixed deployment recipe: factories, tokens, feeds, authority, the
/// DaiFab master factory, then its wiring calls, strictly in order. Every
/// stage blocks on confirmation and any failure aborts the run with no
/// retry and no partial result; on-chain state already created by earlier
/// stages is left as-is.
pub struct ContractDeployer {
    executor: Arc<Executor>,
    contracts: Contracts,
    options: DeployOptions,
}

impl ContractDeployer {
    pub fn new(executor: Arc<Executor>, contracts: Contracts, options: DeployOptions) -> Self {
        Self {
            executor,
            contracts,
            options,
        }
    }

    /// Run the whole recipe and return the role → address mapping. The
    /// caller persists it; nothing is written here, so a failed run can
    /// never leave a partial manifest.
    pub async fn deploy(&self) -> Result<RoleAddresses> {
        let fabs = self.deploy_fabs().await?;
        let tokens = self.deploy_tokens().await?;
        let feeds = self.deploy_feeds().await?;
        let admin = self.deploy_admin().await?;
        let dai_fab = self.deploy_dai_fab(&fabs).await?;
        self.configure(&dai_fab, &tokens, &feeds, &admin).await?;
        let system = self.read_system(&dai_fab).await?;

        let market = if self.options.with_market {
            Some(self.deploy_market(&system, &tokens).await?)
        } else {
            None
        };

        if self.options.smoke_test {
            self.smoke_test(&tokens, &system).await?;
        }

        Ok(collect(&tokens, &feeds, &admin, &system, market.as_ref()))
    }

    /// Create a contract from its compiled artifact and hand back a bound
    /// proxy at the receipt's address.
    async fn create(&self, name: &str, args: &[DynSolValue]) -> Result<Contract> {
        let artifact = self.contracts.get(name)?;
        let data = codec::deploy_data(artifact, args)?;
        let request = TxRequest {
            from: self.executor.sender(),
            to: None,
            data,
            value: U256::ZERO,
            gas_price: self.executor.gas_price(),
        };
        let receipt = self
            .executor
            .execute(&request, &format!("create {name}"))
            .await?;
        let address = receipt
            .contract_address
            .ok_or_else(|| Error::NoContractAddress(name.to_string()))?;
        tracing::info!(contract = name, %address, "created contract");
        Ok(Contract::attach(name, address, &artifact.abi, self.executor.clone()))
    }

    /// Bind a proxy to an already-deployed contract by artifact name.
    fn attach(&self, name: &str, address: Address) -> Result<Contract> {
        let artifact = self.contracts.get(name)?;
        Ok(Contract::attach(name, address, &artifact.abi, self.executor.clone()))
    }

    async fn deploy_fabs(&self) -> Result<Fabs> {
        tracing::info!("deploying factories");
        Ok(Fabs {
            gem_fab: self.create("GemFab", &[]).await?,
            vox_fab: self.create("VoxFab", &[]).await?,
            tub_fab: self.create("TubFab", &[]).await?,
            tap_fab: self.create("TapFab", &[]).await?,
            top_fab: self.create("TopFab", &[]).await?,
            mom_fab: self.create("MomFab", &[]).await?,
            dad_fab: self.create("DadFab", &[]).await?,
        })
    }

    async fn deploy_tokens(&self) -> Result<Tokens> {
        tracing::info!("deploying base tokens");
        Ok(Tokens {
            gem: self.create("WETH9", &[]).await?,
            gov: self.create("DSToken", &[codec::symbol_b32("GOV")]).await?,
        })
    }

    async fn deploy_feeds(&self) -> Result<Feeds> {
        tracing::info!("deploying price feeds");
        let pip = self.create("DSValue", &[]).await?;
        pip.send(
            "poke",
            &[codec::u256_b32(self.options.pip_start_price)],
            "pip.poke",
        )
        .await?;
        let pep = self.create("DSValue", &[]).await?;
        pep.send(
            "poke",
            &[codec::u256_b32(self.options.pep_start_price)],
            "pep.poke",
        )
        .await?;
        Ok(Feeds { pip, pep })
    }

    async fn deploy_admin(&self) -> Result<Admin> {
        tracing::info!("deploying authority and burn sink");
        let adm = self.create("DSRoles", &[]).await?;
        adm.send(
            "setRootUser",
            &[
                DynSolValue::Address(self.executor.sender()),
                DynSolValue::Bool(true),
            ],
            "adm.setRootUser",
        )
        .await?;
        let pit = self.create("GemPit", &[]).await?;
        Ok(Admin { adm, pit })
    }

    async fn deploy_dai_fab(&self, fabs: &Fabs) -> Result<Contract> {
        tracing::info!("deploying DaiFab");
        self.create(
            "DaiFab",
            &[
                addr(&fabs.gem_fab),
                addr(&fabs.vox_fab),
                addr(&fabs.tub_fab),
                addr(&fabs.tap_fab),
                addr(&fabs.top_fab),
                addr(&fabs.mom_fab),
                addr(&fabs.dad_fab),
            ],
        )
        .await
    }

    /// DaiFab's wiring sequence. Order matters: each call builds on state
    /// the previous one created.
    async fn configure(
        &self,
        dai_fab: &Contract,
        tokens: &Tokens,
        feeds: &Feeds,
        admin: &Admin,
    ) -> Result<()> {
        tracing::info!("wiring the system through DaiFab");
        dai_fab.send("makeTokens", &[], "DaiFab.makeTokens").await?;
        dai_fab
            .send(
                "makeVoxTub",
                &[
                    addr(&tokens.gem),
                    addr(&tokens.gov),
                    addr(&feeds.pip),
                    addr(&feeds.pep),
                    addr(&admin.pit),
                ],
                "DaiFab.makeVoxTub",
            )
            .await?;
        dai_fab.send("makeTapTop", &[], "DaiFab.makeTapTop").await?;
        dai_fab
            .send("configParams", &[], "DaiFab.configParams")
            .await?;
        dai_fab
            .send("verifyParams", &[], "DaiFab.verifyParams")
            .await?;
        dai_fab
            .send("configAuth", &[addr(&admin.adm)], "DaiFab.configAuth")
            .await?;
        Ok(())
    }

    async fn read_system(&self, dai_fab: &Contract) -> Result<System> {
        Ok(System {
            sai: dai_fab.call_address("sai").await?,
            sin: dai_fab.call_address("sin").await?,
            skr: dai_fab.call_address("skr").await?,
            dad: dai_fab.call_address("dad").await?,
            mom: dai_fab.call_address("mom").await?,
            vox: dai_fab.call_address("vox").await?,
            tub: dai_fab.call_address("tub").await?,
            tap: dai_fab.call_address("tap").await?,
            top: dai_fab.call_address("top").await?,
        })
    }

    async fn deploy_market(&self, system: &System, tokens: &Tokens) -> Result<Contract> {
        tracing::info!("deploying market");
        let market = self
            .create(
                "MatchingMarket",
                &[DynSolValue::Uint(
                    U256::from(self.options.market_closing_time),
                    64,
                )],
            )
            .await?;
        market
            .send(
                "addTokenPairWhitelist",
                &[
                    DynSolValue::Address(system.sai),
                    DynSolValue::Address(tokens.gem.address()),
                ],
                "oasis.addTokenPairWhitelist",
            )
            .await?;
        Ok(market)
    }

    /// Exercise the freshly wired system end to end: wrap collateral,
    /// grant allowances, join, open a cup, lock and draw against it.
    async fn smoke_test(&self, tokens: &Tokens, system: &System) -> Result<()> {
        tracing::info!("smoke testing the deployed system");
        let tub = self.attach("SaiTub", system.tub)?;
        let skr = self.attach("DSToken", system.skr)?;
        let collateral = self.options.smoke_collateral;

        tokens
            .gem
            .send_as(
                "deposit",
                &[],
                "gem.deposit",
                SendOptions {
                    value: Some(collateral),
                    ..Default::default()
                },
            )
            .await?;
        tokens
            .gem
            .send(
                "approve",
                &[
                    DynSolValue::Address(system.tub),
                    DynSolValue::Uint(U256::MAX, 256),
                ],
                "gem.approve",
            )
            .await?;
        skr.send(
            "approve",
            &[
                DynSolValue::Address(system.tub),
                DynSolValue::Uint(U256::MAX, 256),
            ],
            "skr.approve",
        )
        .await?;
        tub.send("join", &[DynSolValue::Uint(collateral, 256)], "tub.join")
            .await?;
        tub.send("open", &[], "tub.open").await?;

        // The first cup in a fresh tub gets id 1.
        let cup = codec::u256_b32(U256::from(1));
        tub.send(
            "lock",
            &[cup.clone(), DynSolValue::Uint(collateral, 256)],
            "tub.lock",
        )
        .await?;
        tub.send(
            "draw",
            &[cup, DynSolValue::Uint(self.options.smoke_draw, 256)],
            "tub.draw",
        )
        .await?;
        Ok(())
    }
}

fn collect(
    tokens: &Tokens,
    feeds: &Feeds,
    admin: &Admin,
    system: &System,
    market: Option<&Contract>,
) -> RoleAddresses {
    let mut addresses = RoleAddresses::new();
    addresses.insert("gem".to_string(), tokens.gem.address());
    addresses.insert("gov".to_string(), tokens.gov.address());
    addresses.insert("pip".to_string(), feeds.pip.address());
    addresses.insert("pep".to_string(), feeds.pep.address());
    addresses.insert("pit".to_string(), admin.pit.address());
    addresses.insert("adm".to_string(), admin.adm.address());
    addresses.insert("sai".to_string(), system.sai);
    addresses.insert("sin".to_string(), system.sin);
    addresses.insert("skr".to_string(), system.skr);
    addresses.insert("dad".to_string(), system.dad);
    addresses.insert("mom".to_string(), system.mom);
    addresses.insert("vox".to_string(), system.vox);
    addresses.insert("tub".to_string(), system.tub);
    addresses.insert("tap".to_string(), system.tap);
    addresses.insert("top".to_string(), system.top);
    if let Some(market) = market {
        addresses.insert("oasisDex".to_string(), market.address());
    }
    addresses
}
