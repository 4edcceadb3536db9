//! The entity store: one immutable snapshot of all ledger collections.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use stockbook_core::{
    CategoryId, DomainError, DomainResult, ImportId, ManufacturerId, ProductId, SaleId,
    TemplateId, UnitId,
};

use crate::catalog::{
    Category, Manufacturer, ProductDefinition, ProductTemplate, Unit, normalize_code,
};
use crate::records::{ImportRecord, SaleRecord};

/// Parameters for creating or rewriting a receipt batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordImport {
    pub product_id: ProductId,
    pub quantity: i64,
    pub import_price: i64,
    pub selling_price: i64,
    pub year: i32,
    pub invoice_number: String,
    pub invoice_image: Option<String>,
    pub date: DateTime<Utc>,
}

/// Parameters for creating or rewriting a sale record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSale {
    pub product_id: ProductId,
    pub import_record_id: ImportId,
    pub quantity: i64,
    pub price: i64,
    pub date: DateTime<Utc>,
}

/// Parameters for creating or rewriting a product template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub name: String,
    pub category_id: CategoryId,
    pub manufacturer_id: ManufacturerId,
    pub unit_id: UnitId,
}

/// One snapshot of the full ledger state.
///
/// Every mutation validates against the current snapshot and returns a
/// **new** snapshot with `version + 1`; the receiver is never modified.
/// A reader holding a snapshot therefore never observes a half-applied
/// mutation, and the version counter doubles as the staleness signal for
/// anything that would want to cache derived aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EntityStore {
    categories: Vec<Category>,
    units: Vec<Unit>,
    manufacturers: Vec<Manufacturer>,
    product_templates: Vec<ProductTemplate>,
    products: Vec<ProductDefinition>,
    imports: Vec<ImportRecord>,
    sales: Vec<SaleRecord>,
    version: u64,
}

impl EntityStore {
    /// An empty store at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from externally persisted collections (version 0).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        categories: Vec<Category>,
        units: Vec<Unit>,
        manufacturers: Vec<Manufacturer>,
        product_templates: Vec<ProductTemplate>,
        products: Vec<ProductDefinition>,
        imports: Vec<ImportRecord>,
        sales: Vec<SaleRecord>,
    ) -> Self {
        Self {
            categories,
            units,
            manufacturers,
            product_templates,
            products,
            imports,
            sales,
            version: 0,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn manufacturers(&self) -> &[Manufacturer] {
        &self.manufacturers
    }

    pub fn product_templates(&self) -> &[ProductTemplate] {
        &self.product_templates
    }

    pub fn products(&self) -> &[ProductDefinition] {
        &self.products
    }

    pub fn imports(&self) -> &[ImportRecord] {
        &self.imports
    }

    pub fn sales(&self) -> &[SaleRecord] {
        &self.sales
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn manufacturer(&self, id: ManufacturerId) -> Option<&Manufacturer> {
        self.manufacturers.iter().find(|m| m.id == id)
    }

    pub fn product_template(&self, id: TemplateId) -> Option<&ProductTemplate> {
        self.product_templates.iter().find(|t| t.id == id)
    }

    pub fn product(&self, id: ProductId) -> Option<&ProductDefinition> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn product_by_code(&self, code: &str) -> Option<&ProductDefinition> {
        let code = normalize_code(code);
        self.products.iter().find(|p| p.code == code)
    }

    pub fn import(&self, id: ImportId) -> Option<&ImportRecord> {
        self.imports.iter().find(|i| i.id == id)
    }

    pub fn sale(&self, id: SaleId) -> Option<&SaleRecord> {
        self.sales.iter().find(|s| s.id == id)
    }

    /// Manufacturer names available under the given category name, sorted
    /// and deduplicated. `None` applies no category constraint; an unknown
    /// category name yields no choices.
    pub fn manufacturer_names_in(&self, category_name: Option<&str>) -> Vec<String> {
        let names: Vec<String> = match category_name {
            None => self.manufacturers.iter().map(|m| m.name.clone()).collect(),
            Some(name) => match self.categories.iter().find(|c| c.name == name) {
                Some(category) => self
                    .manufacturers
                    .iter()
                    .filter(|m| m.category_id == category.id)
                    .map(|m| m.name.clone())
                    .collect(),
                None => Vec::new(),
            },
        };
        let mut names: Vec<String> = names
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        names.sort();
        names
    }

    /// Case-insensitive substring search over SKU code and product name
    /// (search-as-you-type suggestions). Empty text yields nothing.
    pub fn search_products(&self, text: &str, limit: usize) -> Vec<&ProductDefinition> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.products
            .iter()
            .filter(|p| {
                p.code.to_lowercase().contains(&needle) || p.name.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect()
    }

    fn next(&self) -> EntityStore {
        let mut next = self.clone();
        next.version += 1;
        next
    }

    fn nonempty(value: &str, what: &str) -> DomainResult<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation(format!("{what} cannot be empty")));
        }
        Ok(trimmed.to_string())
    }

    // ---- categories ----

    pub fn create_category(&self, name: &str) -> DomainResult<EntityStore> {
        let name = Self::nonempty(name, "category name")?;
        let mut next = self.next();
        next.categories.push(Category {
            id: CategoryId::new(),
            name,
        });
        Ok(next)
    }

    /// Rename a category and rewrite the denormalized name on every
    /// template linked to it and every product issued from such a
    /// template, in the same snapshot.
    pub fn rename_category(&self, id: CategoryId, new_name: &str) -> DomainResult<EntityStore> {
        let new_name = Self::nonempty(new_name, "category name")?;
        if self.category(id).is_none() {
            return Err(DomainError::not_found());
        }

        let mut next = self.next();
        for category in &mut next.categories {
            if category.id == id {
                category.name = new_name.clone();
            }
        }
        let (templates, products) = rewrite_dependents(
            &mut next,
            |t| t.category_id == id,
            |t| t.category_name = new_name.clone(),
            |p| p.category = new_name.clone(),
        );
        debug!(templates, products, "category renamed");
        Ok(next)
    }

    /// Remove a category row. Dependent templates and products are not
    /// deleted; they keep their last-known-good denormalized names.
    pub fn delete_category(&self, id: CategoryId) -> DomainResult<EntityStore> {
        if self.category(id).is_none() {
            return Err(DomainError::not_found());
        }
        let mut next = self.next();
        next.categories.retain(|c| c.id != id);
        Ok(next)
    }

    // ---- units ----

    pub fn create_unit(&self, name: &str) -> DomainResult<EntityStore> {
        let name = Self::nonempty(name, "unit name")?;
        let mut next = self.next();
        next.units.push(Unit {
            id: UnitId::new(),
            name,
        });
        Ok(next)
    }

    pub fn rename_unit(&self, id: UnitId, new_name: &str) -> DomainResult<EntityStore> {
        let new_name = Self::nonempty(new_name, "unit name")?;
        if self.unit(id).is_none() {
            return Err(DomainError::not_found());
        }

        let mut next = self.next();
        for unit in &mut next.units {
            if unit.id == id {
                unit.name = new_name.clone();
            }
        }
        let (templates, products) = rewrite_dependents(
            &mut next,
            |t| t.unit_id == id,
            |t| t.unit_name = new_name.clone(),
            |p| p.unit = new_name.clone(),
        );
        debug!(templates, products, "unit renamed");
        Ok(next)
    }

    pub fn delete_unit(&self, id: UnitId) -> DomainResult<EntityStore> {
        if self.unit(id).is_none() {
            return Err(DomainError::not_found());
        }
        let mut next = self.next();
        next.units.retain(|u| u.id != id);
        Ok(next)
    }

    // ---- manufacturers ----

    pub fn create_manufacturer(
        &self,
        name: &str,
        category_id: CategoryId,
    ) -> DomainResult<EntityStore> {
        let name = Self::nonempty(name, "manufacturer name")?;
        if self.category(category_id).is_none() {
            return Err(DomainError::not_found());
        }
        let mut next = self.next();
        next.manufacturers.push(Manufacturer {
            id: ManufacturerId::new(),
            name,
            category_id,
        });
        Ok(next)
    }

    /// Rename a manufacturer and/or move it to another category. The
    /// rename cascades through templates and their products; the category
    /// move rewrites only the manufacturer row itself.
    pub fn update_manufacturer(
        &self,
        id: ManufacturerId,
        new_name: &str,
        category_id: CategoryId,
    ) -> DomainResult<EntityStore> {
        let new_name = Self::nonempty(new_name, "manufacturer name")?;
        if self.manufacturer(id).is_none() {
            return Err(DomainError::not_found());
        }
        if self.category(category_id).is_none() {
            return Err(DomainError::not_found());
        }

        let mut next = self.next();
        for manufacturer in &mut next.manufacturers {
            if manufacturer.id == id {
                manufacturer.name = new_name.clone();
                manufacturer.category_id = category_id;
            }
        }
        let (templates, products) = rewrite_dependents(
            &mut next,
            |t| t.manufacturer_id == id,
            |t| t.manufacturer_name = new_name.clone(),
            |p| p.manufacturer = new_name.clone(),
        );
        debug!(templates, products, "manufacturer updated");
        Ok(next)
    }

    pub fn delete_manufacturer(&self, id: ManufacturerId) -> DomainResult<EntityStore> {
        if self.manufacturer(id).is_none() {
            return Err(DomainError::not_found());
        }
        let mut next = self.next();
        next.manufacturers.retain(|m| m.id != id);
        Ok(next)
    }

    // ---- product templates ----

    pub fn create_template(&self, spec: TemplateSpec) -> DomainResult<EntityStore> {
        let (name, category, manufacturer, unit) = self.resolve_template_spec(&spec)?;
        let mut next = self.next();
        next.product_templates.push(ProductTemplate {
            id: TemplateId::new(),
            name,
            category_id: spec.category_id,
            manufacturer_id: spec.manufacturer_id,
            unit_id: spec.unit_id,
            category_name: category,
            manufacturer_name: manufacturer,
            unit_name: unit,
        });
        Ok(next)
    }

    /// Rewrite a template and refresh the denormalized copy held by every
    /// product issued from it.
    pub fn update_template(&self, id: TemplateId, spec: TemplateSpec) -> DomainResult<EntityStore> {
        if self.product_template(id).is_none() {
            return Err(DomainError::not_found());
        }
        let (name, category, manufacturer, unit) = self.resolve_template_spec(&spec)?;

        let mut next = self.next();
        for template in &mut next.product_templates {
            if template.id == id {
                template.name = name.clone();
                template.category_id = spec.category_id;
                template.manufacturer_id = spec.manufacturer_id;
                template.unit_id = spec.unit_id;
                template.category_name = category.clone();
                template.manufacturer_name = manufacturer.clone();
                template.unit_name = unit.clone();
            }
        }
        let mut products = 0usize;
        for product in &mut next.products {
            if product.template_id == id {
                product.name = name.clone();
                product.category = category.clone();
                product.manufacturer = manufacturer.clone();
                product.unit = unit.clone();
                products += 1;
            }
        }
        debug!(products, "template updated");
        Ok(next)
    }

    pub fn delete_template(&self, id: TemplateId) -> DomainResult<EntityStore> {
        if self.product_template(id).is_none() {
            return Err(DomainError::not_found());
        }
        let mut next = self.next();
        next.product_templates.retain(|t| t.id != id);
        Ok(next)
    }

    fn resolve_template_spec(
        &self,
        spec: &TemplateSpec,
    ) -> DomainResult<(String, String, String, String)> {
        let name = Self::nonempty(&spec.name, "template name")?;
        let category = self
            .category(spec.category_id)
            .ok_or_else(DomainError::not_found)?;
        let manufacturer = self
            .manufacturer(spec.manufacturer_id)
            .ok_or_else(DomainError::not_found)?;
        let unit = self.unit(spec.unit_id).ok_or_else(DomainError::not_found)?;
        if manufacturer.category_id != spec.category_id {
            return Err(DomainError::invariant(
                "manufacturer does not belong to the selected category",
            ));
        }
        Ok((
            name,
            category.name.clone(),
            manufacturer.name.clone(),
            unit.name.clone(),
        ))
    }

    // ---- products (SKUs) ----

    pub fn create_product(&self, code: &str, template_id: TemplateId) -> DomainResult<EntityStore> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(DomainError::validation("product code cannot be empty"));
        }
        if self.products.iter().any(|p| p.code == code) {
            return Err(DomainError::conflict("product code already exists"));
        }
        let template = self
            .product_template(template_id)
            .ok_or_else(DomainError::not_found)?;

        let product = ProductDefinition {
            id: ProductId::new(),
            code,
            template_id,
            name: template.name.clone(),
            category: template.category_name.clone(),
            manufacturer: template.manufacturer_name.clone(),
            unit: template.unit_name.clone(),
        };
        let mut next = self.next();
        next.products.push(product);
        Ok(next)
    }

    pub fn update_product(
        &self,
        id: ProductId,
        code: &str,
        template_id: TemplateId,
    ) -> DomainResult<EntityStore> {
        if self.product(id).is_none() {
            return Err(DomainError::not_found());
        }
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(DomainError::validation("product code cannot be empty"));
        }
        if self.products.iter().any(|p| p.code == code && p.id != id) {
            return Err(DomainError::conflict("product code already exists"));
        }
        let template = self
            .product_template(template_id)
            .ok_or_else(DomainError::not_found)?;

        let mut next = self.next();
        for product in &mut next.products {
            if product.id == id {
                product.code = code.clone();
                product.template_id = template_id;
                product.name = template.name.clone();
                product.category = template.category_name.clone();
                product.manufacturer = template.manufacturer_name.clone();
                product.unit = template.unit_name.clone();
            }
        }
        Ok(next)
    }

    pub fn delete_product(&self, id: ProductId) -> DomainResult<EntityStore> {
        if self.product(id).is_none() {
            return Err(DomainError::not_found());
        }
        let mut next = self.next();
        next.products.retain(|p| p.id != id);
        Ok(next)
    }

    // ---- imports (receipt batches) ----

    pub fn record_import(&self, cmd: RecordImport) -> DomainResult<EntityStore> {
        self.validate_import(&cmd)?;
        let mut next = self.next();
        next.imports.push(ImportRecord {
            id: ImportId::new(),
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            import_price: cmd.import_price,
            selling_price: cmd.selling_price,
            year: cmd.year,
            invoice_number: cmd.invoice_number.trim().to_string(),
            invoice_image: cmd.invoice_image,
            date: cmd.date,
        });
        Ok(next)
    }

    /// Rewrite a batch in place. Historical edits are permitted; every
    /// aggregation recomputes from full history, so the change is
    /// reflected immediately.
    pub fn update_import(&self, id: ImportId, cmd: RecordImport) -> DomainResult<EntityStore> {
        if self.import(id).is_none() {
            return Err(DomainError::not_found());
        }
        self.validate_import(&cmd)?;
        let mut next = self.next();
        for import in &mut next.imports {
            if import.id == id {
                import.product_id = cmd.product_id;
                import.quantity = cmd.quantity;
                import.import_price = cmd.import_price;
                import.selling_price = cmd.selling_price;
                import.year = cmd.year;
                import.invoice_number = cmd.invoice_number.trim().to_string();
                import.invoice_image = cmd.invoice_image.clone();
                import.date = cmd.date;
            }
        }
        Ok(next)
    }

    /// Remove a batch. Sales referencing it are left in place and surface
    /// through the report diagnostics as referential gaps.
    pub fn delete_import(&self, id: ImportId) -> DomainResult<EntityStore> {
        if self.import(id).is_none() {
            return Err(DomainError::not_found());
        }
        let mut next = self.next();
        next.imports.retain(|i| i.id != id);
        Ok(next)
    }

    fn validate_import(&self, cmd: &RecordImport) -> DomainResult<()> {
        if self.product(cmd.product_id).is_none() {
            return Err(DomainError::not_found());
        }
        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if cmd.import_price < 0 || cmd.selling_price < 0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        Self::nonempty(&cmd.invoice_number, "invoice number")?;
        Ok(())
    }

    // ---- sales (stock issues) ----

    /// Append an admitted sale. This enforces referential integrity only:
    /// the stock-level guard is the admission check, which the caller runs
    /// immediately before this. Keeping the store permissive here lets
    /// restored historical data load even when it contains anomalies.
    pub fn record_sale(&self, cmd: RecordSale) -> DomainResult<EntityStore> {
        self.validate_sale(&cmd)?;
        let mut next = self.next();
        next.sales.push(SaleRecord {
            id: SaleId::new(),
            product_id: cmd.product_id,
            import_record_id: cmd.import_record_id,
            quantity: cmd.quantity,
            price: cmd.price,
            date: cmd.date,
        });
        Ok(next)
    }

    pub fn update_sale(&self, id: SaleId, cmd: RecordSale) -> DomainResult<EntityStore> {
        if self.sale(id).is_none() {
            return Err(DomainError::not_found());
        }
        self.validate_sale(&cmd)?;
        let mut next = self.next();
        for sale in &mut next.sales {
            if sale.id == id {
                sale.product_id = cmd.product_id;
                sale.import_record_id = cmd.import_record_id;
                sale.quantity = cmd.quantity;
                sale.price = cmd.price;
                sale.date = cmd.date;
            }
        }
        Ok(next)
    }

    pub fn delete_sale(&self, id: SaleId) -> DomainResult<EntityStore> {
        if self.sale(id).is_none() {
            return Err(DomainError::not_found());
        }
        let mut next = self.next();
        next.sales.retain(|s| s.id != id);
        Ok(next)
    }

    fn validate_sale(&self, cmd: &RecordSale) -> DomainResult<()> {
        let batch = self
            .import(cmd.import_record_id)
            .ok_or_else(DomainError::not_found)?;
        if batch.product_id != cmd.product_id {
            return Err(DomainError::invariant(
                "sale product does not match batch product",
            ));
        }
        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if cmd.price < 0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        Ok(())
    }
}

/// Walk the dependency edges master record -> template (by id) and
/// template -> product (by id), rewriting each matching template and each
/// product issued from one. Returns the rewrite counts
/// (templates, products).
fn rewrite_dependents(
    store: &mut EntityStore,
    matches: impl Fn(&ProductTemplate) -> bool,
    apply_template: impl Fn(&mut ProductTemplate),
    apply_product: impl Fn(&mut ProductDefinition),
) -> (usize, usize) {
    let mut templates = 0usize;
    let mut affected: HashSet<TemplateId> = HashSet::new();
    for template in &mut store.product_templates {
        if matches(template) {
            apply_template(template);
            affected.insert(template.id);
            templates += 1;
        }
    }

    let mut products = 0usize;
    for product in &mut store.products {
        if affected.contains(&product.template_id) {
            apply_product(product);
            products += 1;
        }
    }
    (templates, products)
}
