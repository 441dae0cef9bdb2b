use borsh::BorshDeserialize;
use solana_program::{
    clock::Clock, program_pack::Pack, pubkey::Pubkey, rent::Rent, system_instruction,
};
use solana_program_test::*;
use solana_sdk::{
    instruction::Instruction,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use yield_tokenization::{
    constants::{DEFAULT_HEARTBEAT_SECONDS, PRICE_SCALE, SECONDS_PER_DAY},
    instruction::{self, ConversionAccounts, TokenLegAccounts},
    pda::{
        ConverterPDA, LedgerPDA, LiquidityPositionPDA, MaturityPDA, OraclePDA, PoolPDA,
        PositionPDA, PriceFeedPDA, RulePDA, VaultAuthorityPDA,
    },
    state::{
        ConversionRule, ConverterConfig, Direction, HolderPosition, Ledger, LiquidityPosition,
        Maturity, OracleConfig, Pool, PoolAsset, PriceFeed, RuleStatus, RuleTerms,
    },
};

fn program_test() -> ProgramTest {
    ProgramTest::new(
        "yield_tokenization",
        yield_tokenization::id(),
        processor!(yield_tokenization::process_instruction),
    )
}

async fn send(
    banks_client: &mut BanksClient,
    payer: &Keypair,
    instructions: &[Instruction],
    extra_signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let recent_blockhash = banks_client.get_latest_blockhash().await?;
    let mut signers = vec![payer];
    signers.extend_from_slice(extra_signers);
    let mut transaction = Transaction::new_with_payer(instructions, Some(&payer.pubkey()));
    transaction.sign(&signers, recent_blockhash);
    banks_client.process_transaction(transaction).await
}

async fn read<T: BorshDeserialize>(banks_client: &mut BanksClient, key: &Pubkey) -> T {
    let account = banks_client.get_account(*key).await.unwrap().unwrap();
    T::deserialize(&mut &account.data[..]).unwrap()
}

async fn token_balance(banks_client: &mut BanksClient, key: &Pubkey) -> u64 {
    let account = banks_client.get_account(*key).await.unwrap().unwrap();
    spl_token::state::Account::unpack(&account.data).unwrap().amount
}

async fn create_mint(banks_client: &mut BanksClient, payer: &Keypair, rent: &Rent) -> Pubkey {
    let mint = Keypair::new();
    send(
        banks_client,
        payer,
        &[
            system_instruction::create_account(
                &payer.pubkey(),
                &mint.pubkey(),
                rent.minimum_balance(spl_token::state::Mint::LEN),
                spl_token::state::Mint::LEN as u64,
                &spl_token::id(),
            ),
            spl_token::instruction::initialize_mint(
                &spl_token::id(),
                &mint.pubkey(),
                &payer.pubkey(),
                None,
                6,
            )
            .unwrap(),
        ],
        &[&mint],
    )
    .await
    .unwrap();
    mint.pubkey()
}

/// Token account for `mint` owned by `owner`, funded with `amount` when non-zero
async fn create_token_account(
    banks_client: &mut BanksClient,
    payer: &Keypair,
    rent: &Rent,
    mint: &Pubkey,
    owner: &Pubkey,
    amount: u64,
) -> Pubkey {
    let account = Keypair::new();
    let mut instructions = vec![
        system_instruction::create_account(
            &payer.pubkey(),
            &account.pubkey(),
            rent.minimum_balance(spl_token::state::Account::LEN),
            spl_token::state::Account::LEN as u64,
            &spl_token::id(),
        ),
        spl_token::instruction::initialize_account(&spl_token::id(), &account.pubkey(), mint, owner)
            .unwrap(),
    ];
    if amount > 0 {
        instructions.push(
            spl_token::instruction::mint_to(
                &spl_token::id(),
                mint,
                &account.pubkey(),
                &payer.pubkey(),
                &[],
                amount,
            )
            .unwrap(),
        );
    }
    send(banks_client, payer, &instructions, &[&account]).await.unwrap();
    account.pubkey()
}

/// Ledger over a fresh underlying, one maturity, and the payer's position in it
/// after splitting `split_amount`
struct LedgerSetup {
    ledger: Pubkey,
    vault: Pubkey,
    vault_authority: Pubkey,
    holder_token: Pubkey,
    expiry: i64,
    maturity: Pubkey,
    position: Pubkey,
}

async fn setup_ledger(
    banks_client: &mut BanksClient,
    payer: &Keypair,
    expiry_in: i64,
    split_amount: u64,
) -> LedgerSetup {
    let program_id = yield_tokenization::id();
    let rent = banks_client.get_rent().await.unwrap();
    let clock: Clock = banks_client.get_sysvar().await.unwrap();

    let mint = create_mint(banks_client, payer, &rent).await;
    let (ledger, _) = LedgerPDA::derive(&program_id, &mint);
    let (vault_authority, _) = VaultAuthorityPDA::derive(&program_id, &ledger);
    let vault = create_token_account(banks_client, payer, &rent, &mint, &vault_authority, 0).await;
    let holder_token =
        create_token_account(banks_client, payer, &rent, &mint, &payer.pubkey(), 50_000).await;

    let expiry = clock.unix_timestamp + expiry_in;
    let (maturity, _) = MaturityPDA::derive(&program_id, &ledger, expiry);
    let (position, _) = PositionPDA::derive(&program_id, &maturity, &payer.pubkey());

    send(
        banks_client,
        payer,
        &[
            instruction::initialize_ledger(&program_id, &payer.pubkey(), &ledger, &mint, &vault)
                .unwrap(),
            instruction::create_maturity(&program_id, &payer.pubkey(), &ledger, &maturity, expiry)
                .unwrap(),
            instruction::open_position(
                &program_id,
                &payer.pubkey(),
                &payer.pubkey(),
                &maturity,
                &position,
            )
            .unwrap(),
            instruction::split(
                &program_id,
                &payer.pubkey(),
                &ledger,
                &maturity,
                &position,
                &holder_token,
                &vault,
                split_amount,
            )
            .unwrap(),
        ],
        &[],
    )
    .await
    .unwrap();

    LedgerSetup {
        ledger,
        vault,
        vault_authority,
        holder_token,
        expiry,
        maturity,
        position,
    }
}

#[tokio::test]
async fn test_oracle_update_and_breaker() {
    let program_id = yield_tokenization::id();
    let (mut banks_client, payer, _) = program_test().start().await;

    let asset = Pubkey::new_unique();
    let (oracle, _) = OraclePDA::derive(&program_id, &payer.pubkey());
    let (feed, _) = PriceFeedPDA::derive(&program_id, &oracle, &asset);

    send(
        &mut banks_client,
        &payer,
        &[
            instruction::initialize_oracle(&program_id, &payer.pubkey(), &oracle, None, None, None)
                .unwrap(),
            instruction::initialize_price_feed(&program_id, &payer.pubkey(), &oracle, &feed, asset)
                .unwrap(),
        ],
        &[],
    )
    .await
    .unwrap();

    let config: OracleConfig = read(&mut banks_client, &oracle).await;
    assert_eq!(config.heartbeat_seconds, DEFAULT_HEARTBEAT_SECONDS);
    assert_eq!(config.max_deviation_bps, 2_000);

    send(
        &mut banks_client,
        &payer,
        &[instruction::update_price(&program_id, &payer.pubkey(), &oracle, &feed, 4_500_000_000, 8_000)
            .unwrap()],
        &[],
    )
    .await
    .unwrap();

    let record: PriceFeed = read(&mut banks_client, &feed).await;
    assert_eq!(record.price, 4_500_000_000);
    assert_eq!(record.confidence_bps, 8_000);
    assert_eq!(record.updater, payer.pubkey());

    // Not an authorized updater
    let stranger = Keypair::new();
    let result = send(
        &mut banks_client,
        &payer,
        &[instruction::update_price(&program_id, &stranger.pubkey(), &oracle, &feed, 4_600_000_000, 8_000)
            .unwrap()],
        &[&stranger],
    )
    .await;
    assert!(result.is_err());

    // +33% inside the minimum interval: succeeds, latches the breaker, keeps the record
    send(
        &mut banks_client,
        &payer,
        &[instruction::update_price(&program_id, &payer.pubkey(), &oracle, &feed, 6_000_000_000, 8_000)
            .unwrap()],
        &[],
    )
    .await
    .unwrap();

    let config: OracleConfig = read(&mut banks_client, &oracle).await;
    assert!(config.circuit_breaker_active);
    let record: PriceFeed = read(&mut banks_client, &feed).await;
    assert_eq!(record.price, 4_500_000_000);

    send(
        &mut banks_client,
        &payer,
        &[instruction::reset_circuit_breaker(&program_id, &payer.pubkey(), &oracle).unwrap()],
        &[],
    )
    .await
    .unwrap();
    let config: OracleConfig = read(&mut banks_client, &oracle).await;
    assert!(config.is_healthy());
}

#[tokio::test]
async fn test_split_locks_underlying() {
    let program_id = yield_tokenization::id();
    let (mut banks_client, payer, _) = program_test().start().await;

    let setup = setup_ledger(&mut banks_client, &payer, 90 * SECONDS_PER_DAY, 1_000).await;

    let maturity: Maturity = read(&mut banks_client, &setup.maturity).await;
    assert_eq!((maturity.pt_supply, maturity.yt_supply), (1_000, 1_000));
    assert_eq!(maturity.position_count, 1);
    let holding: HolderPosition = read(&mut banks_client, &setup.position).await;
    assert_eq!((holding.pt_balance, holding.yt_balance), (1_000, 1_000));
    let ledger: Ledger = read(&mut banks_client, &setup.ledger).await;
    assert_eq!(ledger.total_locked, 1_000);
    assert_eq!(ledger.maturities, vec![setup.expiry]);
    assert_eq!(token_balance(&mut banks_client, &setup.vault).await, 1_000);
    assert_eq!(token_balance(&mut banks_client, &setup.holder_token).await, 49_000);

    // PT cannot be redeemed before expiry
    let result = send(
        &mut banks_client,
        &payer,
        &[instruction::redeem(
            &program_id,
            &payer.pubkey(),
            &setup.ledger,
            &setup.maturity,
            &setup.position,
            &setup.holder_token,
            &setup.vault,
            &setup.vault_authority,
            100,
        )
        .unwrap()],
        &[],
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_redeem_after_settlement() {
    let program_id = yield_tokenization::id();
    let mut context = program_test().start_with_context().await;

    let setup = setup_ledger(&mut context.banks_client, &context.payer, SECONDS_PER_DAY, 1_000).await;

    let mut clock: Clock = context.banks_client.get_sysvar().await.unwrap();
    clock.unix_timestamp = setup.expiry;
    context.set_sysvar(&clock);

    let redeem = |amount: u64| {
        instruction::redeem(
            &program_id,
            &context.payer.pubkey(),
            &setup.ledger,
            &setup.maturity,
            &setup.position,
            &setup.holder_token,
            &setup.vault,
            &setup.vault_authority,
            amount,
        )
        .unwrap()
    };

    // Expired but not settled
    let unsettled = redeem(500);
    let result = send(&mut context.banks_client, &context.payer, &[unsettled], &[]).await;
    assert!(result.is_err());

    let settle = instruction::settle_maturity(&program_id, &context.payer.pubkey(), &setup.maturity)
        .unwrap();
    let settled_redeem = redeem(400);
    send(&mut context.banks_client, &context.payer, &[settle, settled_redeem], &[])
        .await
        .unwrap();

    let maturity: Maturity = read(&mut context.banks_client, &setup.maturity).await;
    assert!(maturity.settled);
    assert_eq!(maturity.pt_supply, 600);
    assert_eq!(maturity.yt_supply, 1_000);
    assert_eq!(maturity.principal_locked, 600);
    let holding: HolderPosition = read(&mut context.banks_client, &setup.position).await;
    assert_eq!((holding.pt_balance, holding.yt_balance), (600, 1_000));
    let ledger: Ledger = read(&mut context.banks_client, &setup.ledger).await;
    assert_eq!(ledger.total_locked, 600);

    assert_eq!(token_balance(&mut context.banks_client, &setup.vault).await, 600);
    assert_eq!(token_balance(&mut context.banks_client, &setup.holder_token).await, 49_400);
}

#[tokio::test]
async fn test_swap_through_principal_token_pool() {
    let program_id = yield_tokenization::id();
    let (mut banks_client, payer, _) = program_test().start().await;
    let rent = banks_client.get_rent().await.unwrap();

    let setup = setup_ledger(&mut banks_client, &payer, 90 * SECONDS_PER_DAY, 5_000).await;

    let quote_mint = create_mint(&mut banks_client, &payer, &rent).await;
    let payer_quote =
        create_token_account(&mut banks_client, &payer, &rent, &quote_mint, &payer.pubkey(), 10_000)
            .await;

    let pt = PoolAsset::Principal(setup.expiry);
    let usd = PoolAsset::Token(quote_mint);
    let (pool, _) = PoolPDA::derive(&program_id, &setup.maturity, &pt, &usd);
    let (pool_authority, _) = VaultAuthorityPDA::derive(&program_id, &pool);
    let (pool_position, _) = PositionPDA::derive(&program_id, &setup.maturity, &pool);
    let (lp, _) = LiquidityPositionPDA::derive(&program_id, &pool, &payer.pubkey());
    let pool_vault =
        create_token_account(&mut banks_client, &payer, &rent, &quote_mint, &pool_authority, 0).await;

    let token_leg = TokenLegAccounts {
        user_token: payer_quote,
        pool_vault,
        vault_authority: pool_authority,
    };

    send(
        &mut banks_client,
        &payer,
        &[
            instruction::initialize_pool(
                &program_id,
                &payer.pubkey(),
                &setup.maturity,
                &pool,
                &pool_position,
                &pool_authority,
                Some(&pool_vault),
                pt,
                usd,
                30,
            )
            .unwrap(),
            instruction::add_liquidity(
                &program_id,
                &payer.pubkey(),
                &pool,
                &setup.maturity,
                &lp,
                &setup.position,
                &pool_position,
                Some(&token_leg),
                2_000,
                2_000,
            )
            .unwrap(),
        ],
        &[],
    )
    .await
    .unwrap();

    let state: Pool = read(&mut banks_client, &pool).await;
    assert_eq!((state.reserve_a, state.reserve_b, state.total_shares), (2_000, 2_000, 2_000));
    let shares: LiquidityPosition = read(&mut banks_client, &lp).await;
    assert_eq!(shares.shares, 2_000);
    let maturity: Maturity = read(&mut banks_client, &setup.maturity).await;
    assert_eq!(maturity.position_count, 2);

    // The same pair in the other orientation has no room for a second pool
    let (swapped_pool, _) = PoolPDA::derive(&program_id, &setup.maturity, &usd, &pt);
    assert_eq!(swapped_pool, pool);

    // Tokens in, PT out: 100 * 9970 * 2000 / (2000 * 10000 + 100 * 9970) = 94
    send(
        &mut banks_client,
        &payer,
        &[instruction::swap(
            &program_id,
            &payer.pubkey(),
            &pool,
            &setup.maturity,
            &setup.position,
            &pool_position,
            Some(&token_leg),
            100,
            90,
            false,
        )
        .unwrap()],
        &[],
    )
    .await
    .unwrap();

    let state: Pool = read(&mut banks_client, &pool).await;
    assert_eq!(state.reserves(), (1_906, 2_100));
    let holding: HolderPosition = read(&mut banks_client, &setup.position).await;
    assert_eq!(holding.pt_balance, 3_094);
    let custody: HolderPosition = read(&mut banks_client, &pool_position).await;
    assert_eq!(custody.pt_balance, 1_906);
    assert_eq!(token_balance(&mut banks_client, &pool_vault).await, 2_100);
    assert_eq!(token_balance(&mut banks_client, &payer_quote).await, 7_900);

    // PT in, tokens out of the vault: 200 * 9970 * 2100 / (1906 * 10000 + 200 * 9970) = 198
    send(
        &mut banks_client,
        &payer,
        &[instruction::swap(
            &program_id,
            &payer.pubkey(),
            &pool,
            &setup.maturity,
            &setup.position,
            &pool_position,
            Some(&token_leg),
            200,
            0,
            true,
        )
        .unwrap()],
        &[],
    )
    .await
    .unwrap();

    let state: Pool = read(&mut banks_client, &pool).await;
    assert_eq!(state.reserves(), (2_106, 1_902));
    let holding: HolderPosition = read(&mut banks_client, &setup.position).await;
    assert_eq!(holding.pt_balance, 2_894);
    assert_eq!(token_balance(&mut banks_client, &pool_vault).await, 1_902);
    assert_eq!(token_balance(&mut banks_client, &payer_quote).await, 8_098);

    // Slippage floor above the quote
    let result = send(
        &mut banks_client,
        &payer,
        &[instruction::swap(
            &program_id,
            &payer.pubkey(),
            &pool,
            &setup.maturity,
            &setup.position,
            &pool_position,
            Some(&token_leg),
            100,
            1_000,
            false,
        )
        .unwrap()],
        &[],
    )
    .await;
    assert!(result.is_err());
    let unchanged: Pool = read(&mut banks_client, &pool).await;
    assert_eq!(unchanged.reserves(), (2_106, 1_902));

    // Half the shares: 1000 * 2106 / 2000 PT and 1000 * 1902 / 2000 tokens
    send(
        &mut banks_client,
        &payer,
        &[instruction::remove_liquidity(
            &program_id,
            &payer.pubkey(),
            &pool,
            &setup.maturity,
            &lp,
            &setup.position,
            &pool_position,
            Some(&token_leg),
            1_000,
        )
        .unwrap()],
        &[],
    )
    .await
    .unwrap();

    let state: Pool = read(&mut banks_client, &pool).await;
    assert_eq!(state.reserves(), (1_053, 951));
    assert_eq!(state.total_shares, 1_000);
    let shares: LiquidityPosition = read(&mut banks_client, &lp).await;
    assert_eq!(shares.shares, 1_000);
    let holding: HolderPosition = read(&mut banks_client, &setup.position).await;
    assert_eq!(holding.pt_balance, 3_947);
    assert_eq!(token_balance(&mut banks_client, &payer_quote).await, 9_049);
    assert_eq!(token_balance(&mut banks_client, &pool_vault).await, 951);
}

#[tokio::test]
async fn test_check_and_convert() {
    let program_id = yield_tokenization::id();
    let (mut banks_client, payer, _) = program_test().start().await;

    // 10000 PT/YT seed the pool; the payer keeps 2000 of each
    let setup = setup_ledger(&mut banks_client, &payer, 90 * SECONDS_PER_DAY, 12_000).await;

    let pt = PoolAsset::Principal(setup.expiry);
    let yt = PoolAsset::Yield(setup.expiry);
    let (pool, _) = PoolPDA::derive(&program_id, &setup.maturity, &pt, &yt);
    let (pool_authority, _) = VaultAuthorityPDA::derive(&program_id, &pool);
    let (pool_position, _) = PositionPDA::derive(&program_id, &setup.maturity, &pool);
    let (lp, _) = LiquidityPositionPDA::derive(&program_id, &pool, &payer.pubkey());

    let asset = Pubkey::new_unique();
    let (oracle, _) = OraclePDA::derive(&program_id, &payer.pubkey());
    let (feed, _) = PriceFeedPDA::derive(&program_id, &oracle, &asset);
    let (converter, _) = ConverterPDA::derive(&program_id, &oracle, &setup.ledger);
    let (strict_rule, _) = RulePDA::derive(&program_id, &converter, 0);
    let (rule, _) = RulePDA::derive(&program_id, &converter, 1);

    let terms = |min_pt_per_yt: u64| RuleTerms {
        reference_asset: asset,
        threshold_price: 5_000_000_000,
        direction: Direction::Above,
        conversion_bps: None,
        min_confidence_bps: None,
        min_pt_per_yt,
        repeatable: false,
    };

    send(
        &mut banks_client,
        &payer,
        &[
            instruction::initialize_pool(
                &program_id,
                &payer.pubkey(),
                &setup.maturity,
                &pool,
                &pool_position,
                &pool_authority,
                None,
                pt,
                yt,
                30,
            )
            .unwrap(),
            instruction::add_liquidity(
                &program_id,
                &payer.pubkey(),
                &pool,
                &setup.maturity,
                &lp,
                &setup.position,
                &pool_position,
                None,
                10_000,
                10_000,
            )
            .unwrap(),
            // Wide deviation band so the 4.0 -> 5.1 move below is accepted
            instruction::initialize_oracle(&program_id, &payer.pubkey(), &oracle, None, Some(5_000), None)
                .unwrap(),
            instruction::initialize_price_feed(&program_id, &payer.pubkey(), &oracle, &feed, asset)
                .unwrap(),
            instruction::update_price(&program_id, &payer.pubkey(), &oracle, &feed, 4_000_000_000, 8_000)
                .unwrap(),
        ],
        &[],
    )
    .await
    .unwrap();

    send(
        &mut banks_client,
        &payer,
        &[
            instruction::initialize_converter(
                &program_id,
                &payer.pubkey(),
                &oracle,
                &setup.ledger,
                &converter,
                None,
                None,
            )
            .unwrap(),
            // At least 1 PT per YT: more than the pool can give after fees
            instruction::register_conversion_rule(
                &program_id,
                &payer.pubkey(),
                &converter,
                &setup.maturity,
                &pool,
                &strict_rule,
                terms(PRICE_SCALE),
            )
            .unwrap(),
            instruction::register_conversion_rule(
                &program_id,
                &payer.pubkey(),
                &converter,
                &setup.maturity,
                &pool,
                &rule,
                terms(0),
            )
            .unwrap(),
        ],
        &[],
    )
    .await
    .unwrap();

    let accounts = |rule: Pubkey| ConversionAccounts {
        converter,
        rule,
        oracle,
        feed,
        maturity: setup.maturity,
        pool,
        holder_position: setup.position,
        pool_position,
    };

    // 4.0 is below the threshold: the instruction succeeds and changes nothing
    let keeper = Keypair::new();
    send(
        &mut banks_client,
        &payer,
        &[instruction::check_and_convert(&program_id, &keeper.pubkey(), &accounts(rule)).unwrap()],
        &[&keeper],
    )
    .await
    .unwrap();
    let state: ConversionRule = read(&mut banks_client, &rule).await;
    assert_eq!(state.status, RuleStatus::Active);
    assert_eq!(state.executions, 0);

    send(
        &mut banks_client,
        &payer,
        &[instruction::update_price(&program_id, &payer.pubkey(), &oracle, &feed, 5_100_000_000, 8_000)
            .unwrap()],
        &[],
    )
    .await
    .unwrap();

    // Triggered, but the swap misses the rule's floor: everything rolls back
    let result = send(
        &mut banks_client,
        &payer,
        &[instruction::check_and_convert(&program_id, &payer.pubkey(), &accounts(strict_rule)).unwrap()],
        &[],
    )
    .await;
    assert!(result.is_err());
    let state: ConversionRule = read(&mut banks_client, &strict_rule).await;
    assert_eq!(state.status, RuleStatus::Active);
    let holding: HolderPosition = read(&mut banks_client, &setup.position).await;
    assert_eq!((holding.pt_balance, holding.yt_balance), (2_000, 2_000));
    let state: Pool = read(&mut banks_client, &pool).await;
    assert_eq!(state.reserves(), (10_000, 10_000));

    // 1000 YT in: 1000 * 9970 * 10000 / (10000 * 10000 + 1000 * 9970) = 906 PT
    send(
        &mut banks_client,
        &payer,
        &[instruction::check_and_convert(&program_id, &payer.pubkey(), &accounts(rule)).unwrap()],
        &[],
    )
    .await
    .unwrap();

    let state: ConversionRule = read(&mut banks_client, &rule).await;
    assert_eq!(state.status, RuleStatus::Executed);
    assert_eq!(state.executions, 1);
    assert_eq!((state.total_yt_converted, state.total_pt_received), (1_000, 906));
    let holding: HolderPosition = read(&mut banks_client, &setup.position).await;
    assert_eq!((holding.pt_balance, holding.yt_balance), (2_906, 1_000));
    let custody: HolderPosition = read(&mut banks_client, &pool_position).await;
    assert_eq!((custody.pt_balance, custody.yt_balance), (9_094, 11_000));
    let state: Pool = read(&mut banks_client, &pool).await;
    assert_eq!(state.reserves(), (9_094, 11_000));
    let config: ConverterConfig = read(&mut banks_client, &converter).await;
    assert_eq!(config.total_conversions, 1);

    let maturity: Maturity = read(&mut banks_client, &setup.maturity).await;
    assert_eq!((maturity.pt_supply, maturity.yt_supply), (12_000, 12_000));
}
