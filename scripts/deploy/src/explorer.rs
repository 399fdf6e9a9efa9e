/// Whether a block-explorer integration exists for a chain. Chains we cannot
/// resolve an endpoint for are treated the same as chains that have none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExplorerSupport {
    Supported(&'static Explorer),
    Unsupported,
}

/// An Etherscan-family explorer deployment for one chain.
#[derive(Debug, PartialEq)]
pub struct Explorer {
    pub chain: &'static str,
    pub chain_id: u64,
    pub api_url: &'static str,
    pub browser_url: &'static str,
}

const EXPLORERS: &[Explorer] = &[
    Explorer {
        chain: "mainnet",
        chain_id: 1,
        api_url: "https://api.etherscan.io/api",
        browser_url: "https://etherscan.io",
    },
    Explorer {
        chain: "sepolia",
        chain_id: 11155111,
        api_url: "https://api-sepolia.etherscan.io/api",
        browser_url: "https://sepolia.etherscan.io",
    },
    Explorer {
        chain: "holesky",
        chain_id: 17000,
        api_url: "https://api-holesky.etherscan.io/api",
        browser_url: "https://holesky.etherscan.io",
    },
    Explorer {
        chain: "optimism",
        chain_id: 10,
        api_url: "https://api-optimistic.etherscan.io/api",
        browser_url: "https://optimistic.etherscan.io",
    },
    Explorer {
        chain: "polygon",
        chain_id: 137,
        api_url: "https://api.polygonscan.com/api",
        browser_url: "https://polygonscan.com",
    },
    Explorer {
        chain: "base",
        chain_id: 8453,
        api_url: "https://api.basescan.org/api",
        browser_url: "https://basescan.org",
    },
    Explorer {
        chain: "base-sepolia",
        chain_id: 84532,
        api_url: "https://api-sepolia.basescan.org/api",
        browser_url: "https://sepolia.basescan.org",
    },
    Explorer {
        chain: "arbitrum",
        chain_id: 42161,
        api_url: "https://api.arbiscan.io/api",
        browser_url: "https://arbiscan.io",
    },
];

/// Resolves the explorer endpoint for a chain id. This probe cannot fail:
/// an unknown chain id (local nodes included) simply reports no support.
pub fn explorer_support(chain_id: u64) -> ExplorerSupport {
    match EXPLORERS.iter().find(|explorer| explorer.chain_id == chain_id) {
        Some(explorer) => ExplorerSupport::Supported(explorer),
        None => ExplorerSupport::Unsupported,
    }
}
