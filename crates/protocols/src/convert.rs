//! Amounts travel as `primitive_types::U256` inside the client and as
//! `alloy_primitives::U256` at the ABI boundary.

use amm_client_domain::token::TokenAmount;

pub fn to_abi(amount: TokenAmount) -> alloy_primitives::U256 {
    alloy_primitives::U256::from_be_bytes(amount.0.to_big_endian())
}

pub fn from_abi(value: alloy_primitives::U256) -> TokenAmount {
    TokenAmount(primitive_types::U256::from_big_endian(
        &value.to_be_bytes::<32>(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_value() {
        let amount = TokenAmount::parse_units("123456789.123456789123456789", 18).unwrap();
        let abi = to_abi(amount);
        assert_eq!(abi.to_string(), amount.0.to_string());
        assert_eq!(from_abi(abi), amount);
    }
}
