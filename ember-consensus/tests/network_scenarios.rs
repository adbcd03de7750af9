use std::fs;

use ember_consensus::config::{load_parameters, ParamsFile, Saveable};
use ember_consensus::{
    check_proof_of_work, cumulative_emission, next_work_required, reward_for_already_generated,
    tail_emission_threshold, BlockHeader, CompactTarget, ConsensusParameters, EmissionSchedule,
    Hash, HeaderChain, HeaderView, NetworkMode,
};

fn mine(chain: &mut HeaderChain, params: &ConsensusParameters, blocks: usize, spacing: i64) {
    for _ in 0..blocks {
        let tip = chain.tip().expect("chain has a genesis block");
        let time = tip.time() + spacing;
        let bits = next_work_required(tip, time, params).expect("retarget succeeds");
        chain.push(BlockHeader { time, bits });
    }
}

fn genesis(params: &ConsensusParameters) -> HeaderChain {
    let mut chain = HeaderChain::new();
    chain.push(BlockHeader {
        time: 1_735_689_600,
        bits: params.pow_limit_compact(),
    });
    chain
}

fn tip_target(chain: &HeaderChain) -> ember_consensus::U256 {
    chain.tip().unwrap().bits().decode().value
}

#[test]
fn fast_then_slow_mining_moves_difficulty_both_ways() {
    let _ = env_logger::builder().is_test(true).try_init();
    let params = ConsensusParameters::main();
    let mut chain = genesis(&params);

    mine(&mut chain, &params, 200, 8);
    let hardened = tip_target(&chain);
    assert!(!hardened.is_zero());
    assert!(hardened < params.pow_limit());

    mine(&mut chain, &params, 300, 40);
    let eased = tip_target(&chain);
    assert!(eased > hardened);

    for height in 0..chain.len() as u64 {
        let bits = chain.at(height).unwrap().bits();
        assert!(
            check_proof_of_work(Hash::zero(), bits, &params),
            "height {} bits {}",
            height,
            bits
        );
    }
}

#[test]
fn steady_mining_settles_on_a_fixed_target() {
    let params = ConsensusParameters::main();
    let mut chain = genesis(&params);
    mine(&mut chain, &params, 200, 10);

    let settled = chain.tip().unwrap().bits();
    mine(&mut chain, &params, 50, 10);
    assert_eq!(chain.tip().unwrap().bits(), settled);
}

#[test]
fn regression_network_never_retargets() {
    let params = ConsensusParameters::regression();
    let mut chain = genesis(&params);
    mine(&mut chain, &params, 150, 1);
    assert!(chain
        .headers()
        .iter()
        .all(|header| header.bits == CompactTarget::from_consensus(0x207f_ffff)));
}

#[test]
fn emission_reference_values() {
    let params = ConsensusParameters::main();
    let threshold = tail_emission_threshold(&params);
    assert_eq!(threshold, 920_000_000_000_000);
    assert_eq!(reward_for_already_generated(threshold, &params), 2_500_000);
    assert_eq!(
        reward_for_already_generated(threshold + 1_000_000_000_000, &params),
        2_500_000
    );
    assert!(cumulative_emission(1_000, &params) < cumulative_emission(1_001, &params));

    let replayed: u64 = EmissionSchedule::new(&params)
        .take(100)
        .map(|point| point.reward)
        .sum();
    assert_eq!(replayed, cumulative_emission(100, &params));
}

#[test]
fn parameter_file_on_disk() {
    let dir = std::env::temp_dir().join(format!("ember-consensus-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("consensus.toml");

    let mut file = ParamsFile::for_network(NetworkMode::Test);
    file.difficulty_window = Some(60);
    file.save_to_file(&path).unwrap();

    let params = load_parameters(&path).unwrap();
    assert_eq!(params.network_mode(), NetworkMode::Test);
    assert_eq!(params.difficulty_window(), 60);
    assert!(params.allow_min_difficulty_blocks());

    fs::write(&path, "network = \"main\"\ntail_reward = 0\n").unwrap();
    assert!(load_parameters(&path).is_err());

    assert!(load_parameters(dir.join("missing.toml")).is_err());
    fs::remove_dir_all(&dir).unwrap();
}
