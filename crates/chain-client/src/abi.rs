//! Solidity bindings for the read-only calls the service issues

use alloy::sol;

sol! {
    /// Multicall3 batching entry point
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls)
            external payable returns (Result[] memory returnData);
    }

    /// ERC20 token with the optional demurrage sink
    interface IToken {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
        function sinkAddress() external view returns (address);
    }

    /// Swap pool metadata accessors
    interface ISwapPool {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function tokenRegistry() external view returns (address);
        function tokenLimiter() external view returns (address);
    }

    /// Per-(token, holder) input caps
    interface ILimiter {
        function limitOf(address token, address holder) external view returns (uint256);
    }

    /// Enumerable address index
    interface ITokenIndex {
        function have(address member) external view returns (bool);
        function entry(uint256 index) external view returns (address);
    }
}
