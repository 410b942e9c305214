pub mod client;
pub mod eth;
pub mod provider;
pub mod ui;
pub mod wallets;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub mod treasure_types {
    use ethers::contract::abigen;

    abigen!(
        TreasureHunt,
        r#"[
            function digForTreasure(uint8 cell) external payable returns (string)
            function generateTreasure() external
        ]"#
    );
}
