//! Transaction scripts
//!
//! Every transaction carries an ordered script of contract calls executed
//! under a gas budget. The script encodes to a deterministic byte form:
//! one tag byte per operation, strings as u32 little-endian length plus
//! UTF-8 bytes, integers little-endian fixed width.

/// Argument of a contract call
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptArg {
    Address(String),
    Text(String),
    Number(u128),
    Hash(String),
}

/// One operation of a transaction script
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptOp {
    /// Reserve the gas budget for the rest of the script
    AllowGas {
        from: String,
        gas_price: u64,
        gas_limit: u64,
    },
    /// Release the unused remainder of the gas budget
    SpendGas { from: String },
    /// Fungible transfer within one chain
    TransferTokens {
        from: String,
        to: String,
        symbol: String,
        units: u128,
    },
    /// Non-fungible transfer within one chain
    TransferToken {
        from: String,
        to: String,
        symbol: String,
        token_id: u128,
    },
    /// Transfer escrowed toward another chain, named by its address
    CrossTransfer {
        target_chain_address: String,
        symbol: String,
        from: String,
        to: String,
        value: u128,
    },
    /// Generic contract call
    CallContract {
        contract: String,
        method: String,
        args: Vec<ScriptArg>,
    },
}

const TAG_ALLOW_GAS: u8 = 0x01;
const TAG_SPEND_GAS: u8 = 0x02;
const TAG_TRANSFER_TOKENS: u8 = 0x03;
const TAG_TRANSFER_TOKEN: u8 = 0x04;
const TAG_CROSS_TRANSFER: u8 = 0x05;
const TAG_CALL_CONTRACT: u8 = 0x06;

const ARG_ADDRESS: u8 = 0x10;
const ARG_TEXT: u8 = 0x11;
const ARG_NUMBER: u8 = 0x12;
const ARG_HASH: u8 = 0x13;

/// Ordered operation list of one transaction
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    ops: Vec<ScriptOp>,
}

impl Script {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn push(&mut self, op: ScriptOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[ScriptOp] {
        &self.ops
    }

    /// Append the deterministic byte encoding of this script
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        write_u32(buf, self.ops.len() as u32);
        for op in &self.ops {
            encode_op(buf, op);
        }
    }
}

fn encode_op(buf: &mut Vec<u8>, op: &ScriptOp) {
    match op {
        ScriptOp::AllowGas {
            from,
            gas_price,
            gas_limit,
        } => {
            buf.push(TAG_ALLOW_GAS);
            write_str(buf, from);
            write_u64(buf, *gas_price);
            write_u64(buf, *gas_limit);
        }
        ScriptOp::SpendGas { from } => {
            buf.push(TAG_SPEND_GAS);
            write_str(buf, from);
        }
        ScriptOp::TransferTokens {
            from,
            to,
            symbol,
            units,
        } => {
            buf.push(TAG_TRANSFER_TOKENS);
            write_str(buf, from);
            write_str(buf, to);
            write_str(buf, symbol);
            write_u128(buf, *units);
        }
        ScriptOp::TransferToken {
            from,
            to,
            symbol,
            token_id,
        } => {
            buf.push(TAG_TRANSFER_TOKEN);
            write_str(buf, from);
            write_str(buf, to);
            write_str(buf, symbol);
            write_u128(buf, *token_id);
        }
        ScriptOp::CrossTransfer {
            target_chain_address,
            symbol,
            from,
            to,
            value,
        } => {
            buf.push(TAG_CROSS_TRANSFER);
            write_str(buf, target_chain_address);
            write_str(buf, symbol);
            write_str(buf, from);
            write_str(buf, to);
            write_u128(buf, *value);
        }
        ScriptOp::CallContract {
            contract,
            method,
            args,
        } => {
            buf.push(TAG_CALL_CONTRACT);
            write_str(buf, contract);
            write_str(buf, method);
            write_u32(buf, args.len() as u32);
            for arg in args {
                encode_arg(buf, arg);
            }
        }
    }
}

fn encode_arg(buf: &mut Vec<u8>, arg: &ScriptArg) {
    match arg {
        ScriptArg::Address(s) => {
            buf.push(ARG_ADDRESS);
            write_str(buf, s);
        }
        ScriptArg::Text(s) => {
            buf.push(ARG_TEXT);
            write_str(buf, s);
        }
        ScriptArg::Number(n) => {
            buf.push(ARG_NUMBER);
            write_u128(buf, *n);
        }
        ScriptArg::Hash(s) => {
            buf.push(ARG_HASH);
            write_str(buf, s);
        }
    }
}

pub(crate) fn write_str(buf: &mut Vec<u8>, s: &str) {
    write_u32(buf, s.len() as u32);
    buf.extend_from_slice(s.as_bytes());
}

pub(crate) fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn write_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn write_u128(buf: &mut Vec<u8>, v: u128) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn write_i64(buf: &mut Vec<u8>, v: i64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_script() -> Script {
        let mut script = Script::new();
        script.push(ScriptOp::AllowGas {
            from: "Sf00d".to_string(),
            gas_price: 1,
            gas_limit: 9999,
        });
        script.push(ScriptOp::CallContract {
            contract: "block".to_string(),
            method: "SettleBlock".to_string(),
            args: vec![
                ScriptArg::Address("chain:main".to_string()),
                ScriptArg::Hash("0xblock".to_string()),
            ],
        });
        script.push(ScriptOp::SpendGas {
            from: "Sf00d".to_string(),
        });
        script
    }

    #[test]
    fn encoding_is_deterministic() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        sample_script().encode_into(&mut a);
        sample_script().encode_into(&mut b);
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn distinct_scripts_encode_differently() {
        let mut a = Vec::new();
        sample_script().encode_into(&mut a);

        let mut other = sample_script();
        other.push(ScriptOp::SpendGas {
            from: "Sbeef".to_string(),
        });
        let mut b = Vec::new();
        other.encode_into(&mut b);

        assert_ne!(a, b);
    }

    #[test]
    fn op_count_is_prefixed() {
        let mut buf = Vec::new();
        sample_script().encode_into(&mut buf);
        assert_eq!(u32::from_le_bytes(buf[0..4].try_into().unwrap()), 3);
    }
}
