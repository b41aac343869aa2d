//! SQL text for the storefront schema.
//!
//! The schema name is the only identifier rendered into statements and is
//! validated by [`SchemaName`]. Every value travels as a `?` parameter.

use crate::domain::SchemaName;

pub(crate) const ORDER_TABLE: &str = "order";
pub(crate) const ORDER_DETAILS_TABLE: &str = "order_details";

/// DDL and DML bound to one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Statements {
    pub use_schema: String,
    pub create_schema: String,
    pub create_order_table: String,
    pub create_order_details_table: String,
    pub insert_order: String,
    pub insert_detail: String,
    pub find_order_ids: String,
    pub delete_details: String,
    pub delete_order: String,
}

impl Statements {
    pub(crate) fn new(schema: &SchemaName) -> Self {
        let order = schema.qualify(ORDER_TABLE);
        let details = schema.qualify(ORDER_DETAILS_TABLE);
        Self {
            use_schema: format!("USE {}", schema.quoted()),
            create_schema: format!("CREATE SCHEMA {}", schema.quoted()),
            create_order_table: format!(
                "CREATE TABLE {order} (\n\
                 order_id INT NOT NULL AUTO_INCREMENT,\n\
                 order_date DATETIME NOT NULL,\n\
                 PRIMARY KEY (order_id)\n\
                 )"
            ),
            create_order_details_table: format!(
                "CREATE TABLE {details} (\n\
                 order_detail_id INT NOT NULL AUTO_INCREMENT,\n\
                 item_description TEXT,\n\
                 order_id INT DEFAULT NULL,\n\
                 PRIMARY KEY (order_detail_id),\n\
                 KEY FK_ORDERID (order_id),\n\
                 CONSTRAINT FK_ORDERID FOREIGN KEY (order_id)\n\
                 REFERENCES {order} (order_id) ON DELETE CASCADE\n\
                 )"
            ),
            insert_order: format!("INSERT INTO {order} (order_date) VALUES (?)"),
            insert_detail: format!(
                "INSERT INTO {details} (order_id, item_description) VALUES (?, ?)"
            ),
            find_order_ids: format!(
                "SELECT order_id FROM {details} WHERE item_description = ? \
                 ORDER BY order_detail_id"
            ),
            delete_details: format!("DELETE FROM {details} WHERE order_id = ?"),
            delete_order: format!("DELETE FROM {order} WHERE order_id = ?"),
        }
    }
}
