//! Sample model catalogs.

use reinhardt_loadfixtures::catalog::{FieldInfo, ModelCatalog, ModelInfo};

/// `library.Author`, `library.Book` relating to it, and the auto-created
/// `library.Book_co_authors` join.
pub fn library() -> ModelCatalog {
	let mut catalog = ModelCatalog::new();
	catalog
		.register_model(ModelInfo::new("library", "Author").with_field(FieldInfo::new("name")))
		.unwrap();
	catalog
		.register_model(
			ModelInfo::new("library", "Book")
				.with_field(FieldInfo::new("title"))
				.with_field(FieldInfo::foreign_key("author", "Author"))
				.with_field(FieldInfo::many_to_many("co_authors", "Author")),
		)
		.unwrap();
	catalog
}

/// A catalog whose models all live in the `shop` app.
pub fn shop() -> ModelCatalog {
	let mut catalog = ModelCatalog::new();
	catalog
		.register_model(ModelInfo::new("shop", "Customer").with_field(FieldInfo::new("email")))
		.unwrap();
	catalog
		.register_model(
			ModelInfo::new("shop", "Order")
				.with_field(FieldInfo::foreign_key("customer", "Customer"))
				.with_field(FieldInfo::foreign_key("parent", "self")),
		)
		.unwrap();
	catalog
		.register_model(
			ModelInfo::new("shop", "OrderItem").with_field(FieldInfo::foreign_key("order", "shop.Order")),
		)
		.unwrap();
	catalog
}
