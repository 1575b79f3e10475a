pub(crate) mod assets_constants;
pub(crate) mod assets_errors;
pub(crate) mod assets_model;
pub(crate) mod assets_repository;
pub(crate) mod assets_service;
pub(crate) mod assets_traits;


pub use assets_constants::*;
pub use assets_errors::AssetError;
pub use assets_model::{Asset, AssetOverview, MarketStock, NewAsset, UpdateAsset};
pub use assets_repository::AssetRepository;
pub use assets_service::AssetService;
pub use assets_traits::{AssetRepositoryTrait, AssetServiceTrait};
