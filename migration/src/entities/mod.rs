pub mod file_upload;
pub mod petition;
pub mod product_category;
pub mod wish_product;

pub use file_upload::Entity as FileUploadEntity;
pub use petition::Entity as PetitionEntity;
pub use product_category::Entity as ProductCategoryEntity;
pub use wish_product::Entity as WishProductEntity;
