//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod budget;
pub mod budget_item;
pub mod category;
pub mod customer;
pub mod enums;
pub mod image;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_category;
pub mod product_image;
pub mod product_related;
pub mod responsible;

// Re-export specific types to avoid conflicts
pub use budget::{Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use budget_item::{Column as BudgetItemColumn, Entity as BudgetItem, Model as BudgetItemModel};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use customer::{Column as CustomerColumn, Entity as Customer, Model as CustomerModel};
pub use enums::{BudgetStatus, ImageTag, OrderStatus, PriceType};
pub use image::{Column as ImageColumn, Entity as Image, Model as ImageModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use product_category::{Entity as ProductCategory, Model as ProductCategoryModel};
pub use product_image::{Entity as ProductImage, Model as ProductImageModel};
pub use product_related::{Entity as ProductRelated, Model as ProductRelatedModel};
pub use responsible::{
    Column as ResponsibleColumn, Entity as Responsible, Model as ResponsibleModel,
};
