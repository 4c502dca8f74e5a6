//! Contract bindings.

pub mod erc20 {
    alloy::sol! {
        /// Standard fungible token interface.
        #[sol(rpc)]
        #[derive(Debug)]
        interface IERC20 {
            event Transfer(address indexed from, address indexed to, uint256 value);
            event Approval(address indexed owner, address indexed spender, uint256 value);

            function name() external view returns (string);
            function symbol() external view returns (string);
            function decimals() external view returns (uint8);
            function totalSupply() external view returns (uint256);
            function balanceOf(address owner) external view returns (uint256);
            function allowance(address owner, address spender) external view returns (uint256);

            function transfer(address to, uint256 amount) external returns (bool);
            function approve(address spender, uint256 amount) external returns (bool);
        }
    }
}

pub mod p2p {
    alloy::sol! {
        /// Peer-to-peer token exchange.
        ///
        /// Offer field order follows the deployed contract:
        /// `(id, maker, tokenSell, amountSell, tokenBuy, amountBuy, status)`,
        /// `status` being `0` (open), `1` (filled) or `2` (cancelled).
        #[sol(rpc)]
        #[derive(Debug, PartialEq, Eq)]
        contract P2PExchange {
            struct Offer {
                uint256 id;
                address maker;
                address tokenSell;
                uint256 amountSell;
                address tokenBuy;
                uint256 amountBuy;
                uint8 status;
            }

            event OfferCreated(
                uint256 indexed offerId,
                address indexed maker,
                address tokenSell,
                uint256 amountSell,
                address tokenBuy,
                uint256 amountBuy
            );
            event OfferFilled(uint256 indexed offerId, address indexed taker);
            event OfferCancelled(uint256 indexed offerId);

            function createOffer(
                address tokenSell,
                uint256 amountSell,
                address tokenBuy,
                uint256 amountBuy
            ) external returns (uint256 offerId);
            function fillOffer(uint256 offerId) external;
            function cancelOffer(uint256 offerId) external;

            function getOpenOffers() external view returns (uint256[] memory);
            function getOffer(uint256 offerId) external view returns (Offer memory);
        }
    }
}
