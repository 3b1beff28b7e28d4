use alloy::rpc::types::Log;
use alloy::sol;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, B256, address, hex, keccak256};

sol! {
    event Transfer(address indexed from, address indexed to, uint256 value);
    event Approval(address indexed owner, address indexed spender, uint256 value);

    function balanceOf(address owner) external view returns (uint256);
    function allowance(address owner, address spender) external view returns (uint256);
    function mint(address to, uint256 amount) external;
    function transfer(address to, uint256 amount) external returns (bool);
    function approve(address spender, uint256 amount) external returns (bool);

    function resolver(bytes32 node) external view returns (address);
    function name(bytes32 node) external view returns (string);
}

/// ENS registry, same address on mainnet and Sepolia.
pub const ENS_REGISTRY: Address = address!("0x00000000000C2E074eC69A0bFb2997BA6C7d2e1e");

pub fn decode_transfer_event(log: &Log) -> anyhow::Result<Transfer> {
    if log.topics().first() != Some(&Transfer::SIGNATURE_HASH) {
        anyhow::bail!("Log is not a Transfer event");
    }
    let log_data = log.data();
    let decoded = Transfer::decode_raw_log(log.topics(), &log_data.data)?;
    Ok(decoded)
}

pub fn decode_approval_event(log: &Log) -> anyhow::Result<Approval> {
    if log.topics().first() != Some(&Approval::SIGNATURE_HASH) {
        anyhow::bail!("Log is not an Approval event");
    }
    let log_data = log.data();
    let decoded = Approval::decode_raw_log(log.topics(), &log_data.data)?;
    Ok(decoded)
}

/// EIP-137 namehash.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(label_hash.as_slice());
        node = keccak256(buf);
    }
    node
}

/// Node of `<hex address>.addr.reverse`, used for reverse resolution.
pub fn reverse_node(address: Address) -> B256 {
    let hex_addr = hex::encode(address.as_slice());
    namehash(&format!("{hex_addr}.addr.reverse"))
}
