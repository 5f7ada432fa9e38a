//! Product commands with producer-side validation.
//!
//! Validation runs synchronously before any event is appended; an invalid
//! command never writes a partial event.

use common::ProductId;

use crate::error::DomainError;

use super::Money;

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_PRICE_CENTS: i64 = 1_000_000 * 100;
const MAX_STOCK: u32 = 100_000;

fn validate_fields(
    name: &str,
    description: Option<&str>,
    price: Money,
    stock: u32,
) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::Validation("Product name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::Validation(format!(
            "Product name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if let Some(description) = description
        && description.chars().count() > MAX_DESCRIPTION_LEN
    {
        return Err(DomainError::Validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    if price.is_negative() || price.cents() > MAX_PRICE_CENTS {
        return Err(DomainError::Validation(
            "Price must be between $0 and $1,000,000".into(),
        ));
    }
    if stock > MAX_STOCK {
        return Err(DomainError::Validation(format!(
            "Stock must be at most {MAX_STOCK}"
        )));
    }
    Ok(())
}

/// Command to create a new product.
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub stock: u32,
    pub price: Money,
}

impl CreateProduct {
    /// Creates a new CreateProduct command.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        stock: u32,
        price: Money,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            stock,
            price,
        }
    }

    /// Validates the command fields.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_fields(
            &self.name,
            self.description.as_deref(),
            self.price,
            self.stock,
        )
    }
}

/// Command to update an existing product.
#[derive(Debug, Clone)]
pub struct UpdateProduct {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub is_active: bool,
}

impl UpdateProduct {
    /// Creates a new UpdateProduct command with `is_active` defaulted to true.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        description: Option<String>,
        price: Money,
        stock: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description,
            price,
            stock,
            is_active: true,
        }
    }

    /// Validates the command fields.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_fields(
            &self.name,
            self.description.as_deref(),
            self.price,
            self.stock,
        )
    }
}

/// Command to delete a product.
#[derive(Debug, Clone)]
pub struct DeleteProduct {
    pub id: ProductId,
}

impl DeleteProduct {
    /// Creates a new DeleteProduct command.
    pub fn new(id: ProductId) -> Self {
        Self { id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> CreateProduct {
        CreateProduct::new("Widget", None, 10, Money::from_cents(999))
    }

    #[test]
    fn valid_command_passes() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn empty_name_rejected() {
        let mut cmd = valid_create();
        cmd.name = "   ".to_string();
        assert!(matches!(cmd.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn overlong_name_rejected() {
        let mut cmd = valid_create();
        cmd.name = "x".repeat(101);
        assert!(cmd.validate().is_err());

        cmd.name = "x".repeat(100);
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn overlong_description_rejected() {
        let mut cmd = valid_create();
        cmd.description = Some("x".repeat(501));
        assert!(cmd.validate().is_err());

        cmd.description = Some("x".repeat(500));
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn negative_price_rejected() {
        let mut cmd = valid_create();
        cmd.price = Money::from_cents(-1);
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn excessive_price_rejected() {
        let mut cmd = valid_create();
        cmd.price = Money::from_dollars(1_000_001);
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn excessive_stock_rejected() {
        let mut cmd = valid_create();
        cmd.stock = 100_001;
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn update_command_validates_same_rules() {
        let cmd = UpdateProduct::new(
            ProductId::new("p1"),
            "",
            None,
            Money::from_cents(999),
            10,
        );
        assert!(cmd.validate().is_err());
    }
}
