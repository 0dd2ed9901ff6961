use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::Result;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// In-memory database for tests. A single connection keeps every
    /// query on the same memory database.
    #[cfg(test)]
    pub async fn memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                is_verified INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS file_uploads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                extname TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                size INTEGER NOT NULL,
                path TEXT NOT NULL,
                url TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS countries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                iso TEXT UNIQUE NOT NULL,
                phone_code TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS industry_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for table in [
            "product_categories",
            "service_categories",
            "regulation_service_categories",
            "marketing_service_categories",
        ] {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                "#
            ))
            .execute(&self.pool)
            .await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS manufacturers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                pic_name TEXT,
                description TEXT,
                address TEXT,
                website TEXT,
                video TEXT,
                about TEXT,
                country_id INTEGER REFERENCES countries(id) ON DELETE SET NULL,
                industry_category_id INTEGER REFERENCES industry_categories(id) ON DELETE SET NULL,
                category_id_one INTEGER REFERENCES product_categories(id) ON DELETE SET NULL,
                category_id_two INTEGER REFERENCES product_categories(id) ON DELETE SET NULL,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                logo_id INTEGER REFERENCES file_uploads(id) ON DELETE SET NULL,
                profile_file_id INTEGER REFERENCES file_uploads(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS healthcares (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                description TEXT,
                address TEXT,
                country_id INTEGER REFERENCES countries(id) ON DELETE SET NULL,
                industry_category_id INTEGER REFERENCES industry_categories(id) ON DELETE SET NULL,
                category_id_one INTEGER REFERENCES product_categories(id) ON DELETE SET NULL,
                category_id_two INTEGER REFERENCES product_categories(id) ON DELETE SET NULL,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                logo_id INTEGER REFERENCES file_uploads(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Owned catalogs: products and services share one shape
        for (table, category_table) in [
            ("products", "product_categories"),
            ("services", "service_categories"),
        ] {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    slug TEXT UNIQUE NOT NULL,
                    description TEXT,
                    is_published INTEGER NOT NULL DEFAULT 0,
                    thumbnail_id INTEGER REFERENCES file_uploads(id) ON DELETE SET NULL,
                    category_id INTEGER REFERENCES {category_table}(id) ON DELETE SET NULL,
                    manufacturer_id INTEGER NOT NULL REFERENCES manufacturers(id) ON DELETE CASCADE,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                "#
            ))
            .execute(&self.pool)
            .await?;
        }

        for parent in ["product", "service"] {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {parent}_tags (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    {parent}_id INTEGER NOT NULL REFERENCES {parent}s(id) ON DELETE CASCADE,
                    tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                "#
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {parent}_media (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    {parent}_id INTEGER NOT NULL REFERENCES {parent}s(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    url TEXT NOT NULL,
                    media_type TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                "#
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {parent}_specifications (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    {parent}_id INTEGER NOT NULL REFERENCES {parent}s(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    value TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                "#
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {parent}_clinical_applications (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    {parent}_id INTEGER NOT NULL REFERENCES {parent}s(id) ON DELETE CASCADE,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                "#
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {parent}_workflows (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    {parent}_id INTEGER NOT NULL REFERENCES {parent}s(id) ON DELETE CASCADE,
                    seq INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                "#
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {parent}_qas (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    {parent}_id INTEGER NOT NULL REFERENCES {parent}s(id) ON DELETE CASCADE,
                    question TEXT NOT NULL,
                    answer TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                "#
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {parent}_user_manuals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    {parent}_id INTEGER NOT NULL REFERENCES {parent}s(id) ON DELETE CASCADE,
                    file_id INTEGER REFERENCES file_uploads(id) ON DELETE SET NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                "#
            ))
            .execute(&self.pool)
            .await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS product_comparisons (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                comp_product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS product_comp_specs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_comparison_id INTEGER NOT NULL REFERENCES product_comparisons(id) ON DELETE CASCADE,
                origin_spec_id INTEGER NOT NULL REFERENCES product_specifications(id) ON DELETE CASCADE,
                comp_spec_id INTEGER NOT NULL REFERENCES product_specifications(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS news (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                slug TEXT UNIQUE NOT NULL,
                content TEXT NOT NULL,
                is_published INTEGER NOT NULL DEFAULT 0,
                image_id INTEGER REFERENCES file_uploads(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS gov_affairs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                slug TEXT UNIQUE NOT NULL,
                content TEXT NOT NULL,
                is_published INTEGER NOT NULL DEFAULT 0,
                country_id INTEGER REFERENCES countries(id) ON DELETE SET NULL,
                image_id INTEGER REFERENCES file_uploads(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for (table, category_table) in [
            ("regulation_services", "regulation_service_categories"),
            ("marketing_services", "marketing_service_categories"),
        ] {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    is_published INTEGER NOT NULL DEFAULT 0,
                    category_id INTEGER REFERENCES {category_table}(id) ON DELETE SET NULL,
                    country_id INTEGER REFERENCES countries(id) ON DELETE SET NULL,
                    image_id INTEGER REFERENCES file_uploads(id) ON DELETE SET NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                "#
            ))
            .execute(&self.pool)
            .await?;
        }

        for table in [
            "risk_classifications",
            "specimen_types",
            "regulatory_agencies",
            "daeler_types",
        ] {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL
                )
                "#
            ))
            .execute(&self.pool)
            .await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS regulation_assessments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                manufacturer_id INTEGER NOT NULL REFERENCES manufacturers(id) ON DELETE CASCADE,
                country_id INTEGER REFERENCES countries(id) ON DELETE SET NULL,
                risk_classification_id INTEGER REFERENCES risk_classifications(id) ON DELETE SET NULL,
                specimen_type_id INTEGER REFERENCES specimen_types(id) ON DELETE SET NULL,
                product_owner TEXT,
                device_label TEXT,
                device_identifier TEXT,
                intended_purpose TEXT,
                status TEXT NOT NULL DEFAULT 'submitted',
                importer_license_id INTEGER REFERENCES file_uploads(id) ON DELETE SET NULL,
                wholesaler_license_id INTEGER REFERENCES file_uploads(id) ON DELETE SET NULL,
                manufacturer_license_id INTEGER REFERENCES file_uploads(id) ON DELETE SET NULL,
                medical_license_id INTEGER REFERENCES file_uploads(id) ON DELETE SET NULL,
                testing_report_id INTEGER REFERENCES file_uploads(id) ON DELETE SET NULL,
                user_manual_id INTEGER REFERENCES file_uploads(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS regulation_assessment_agencies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                regulation_assessment_id INTEGER NOT NULL REFERENCES regulation_assessments(id) ON DELETE CASCADE,
                regulatory_agency_id INTEGER NOT NULL REFERENCES regulatory_agencies(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS regulation_assessment_daeler_types (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                regulation_assessment_id INTEGER NOT NULL REFERENCES regulation_assessments(id) ON DELETE CASCADE,
                daeler_type_id INTEGER NOT NULL REFERENCES daeler_types(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Indexes
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_manufacturers_user_id ON manufacturers(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_healthcares_user_id ON healthcares(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_manufacturer_id ON products(manufacturer_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_services_manufacturer_id ON services(manufacturer_id)")
            .execute(&self.pool)
            .await?;
        for parent in ["product", "service"] {
            for child in [
                "tags",
                "media",
                "specifications",
                "clinical_applications",
                "workflows",
                "qas",
                "user_manuals",
            ] {
                sqlx::query(&format!(
                    "CREATE INDEX IF NOT EXISTS idx_{parent}_{child}_parent ON {parent}_{child}({parent}_id)"
                ))
                .execute(&self.pool)
                .await?;
            }
        }
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_product_comparisons_product_id ON product_comparisons(product_id)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_regulation_assessments_manufacturer_id ON regulation_assessments(manufacturer_id)",
        )
        .execute(&self.pool)
        .await?;

        self.seed_lookups().await?;

        tracing::info!("Database migrations completed");
        Ok(())
    }

    /// Idempotent seed of the fixed lookup tables.
    async fn seed_lookups(&self) -> Result<()> {
        for (id, name, iso, phone_code) in COUNTRIES {
            sqlx::query(
                "INSERT OR IGNORE INTO countries (id, name, iso, phone_code) VALUES (?, ?, ?, ?)",
            )
            .bind(id)
            .bind(name)
            .bind(iso)
            .bind(phone_code)
            .execute(&self.pool)
            .await?;
        }

        let fixed: [(&str, &[(i64, &str)]); 5] = [
            (
                "industry_categories",
                &[
                    (1, "Medical Enterprise and Device Manufacturer"),
                    (2, "Solution and Services Provider"),
                ],
            ),
            (
                "risk_classifications",
                &[
                    (1, "Class A"),
                    (2, "Class B"),
                    (3, "Class C"),
                    (4, "Class D"),
                    (5, "Not Sure"),
                ],
            ),
            (
                "specimen_types",
                &[
                    (1, "Blood and blood fractions (plasma, serum, buffy coat, red blood cells)"),
                    (2, "Tissue (from surgery, autopsy, transplant)"),
                    (3, "Urine"),
                    (4, "Saliva/buccal cells"),
                    (5, "Placental tissue, meconium, cord blood"),
                    (6, "Bone marrow"),
                    (7, "Breast milk"),
                    (8, "Bronchoalveolar lavage"),
                    (9, "Cell lines"),
                    (10, "Exhaled air"),
                    (11, "Feces"),
                    (12, "Fluids from cytology (ascites, pleural fluid, synovial fluid, etc.)"),
                    (13, "Hair"),
                    (14, "Nail clippings"),
                    (15, "Semen"),
                ],
            ),
            (
                "regulatory_agencies",
                &[
                    (1, "Australia Therapeutic Goods Administration"),
                    (2, "European Union Notified Bodies for Class B"),
                    (3, "Health Canada"),
                    (4, "Japan Ministry of Health, Labour and Welfare"),
                    (5, "US Food and Drug Administration"),
                    (6, "Other"),
                ],
            ),
            ("daeler_types", &[(1, "Importer"), (2, "Manufacturer")]),
        ];

        for (table, rows) in fixed {
            for (id, name) in rows {
                sqlx::query(&format!(
                    "INSERT OR IGNORE INTO {table} (id, name) VALUES (?, ?)"
                ))
                .bind(id)
                .bind(name)
                .execute(&self.pool)
                .await?;
            }
        }

        Ok(())
    }
}

const COUNTRIES: [(i64, &str, &str, &str); 40] = [
    (1, "Australia", "AU", "+61"),
    (2, "Austria", "AT", "+43"),
    (3, "Belgium", "BE", "+32"),
    (4, "Brazil", "BR", "+55"),
    (5, "Canada", "CA", "+1"),
    (6, "China", "CN", "+86"),
    (7, "Denmark", "DK", "+45"),
    (8, "Egypt", "EG", "+20"),
    (9, "Finland", "FI", "+358"),
    (10, "France", "FR", "+33"),
    (11, "Germany", "DE", "+49"),
    (12, "India", "IN", "+91"),
    (13, "Indonesia", "ID", "+62"),
    (14, "Ireland", "IE", "+353"),
    (15, "Israel", "IL", "+972"),
    (16, "Italy", "IT", "+39"),
    (17, "Japan", "JP", "+81"),
    (18, "Malaysia", "MY", "+60"),
    (19, "Mexico", "MX", "+52"),
    (20, "Netherlands", "NL", "+31"),
    (21, "New Zealand", "NZ", "+64"),
    (22, "Norway", "NO", "+47"),
    (23, "Pakistan", "PK", "+92"),
    (24, "Philippines", "PH", "+63"),
    (25, "Poland", "PL", "+48"),
    (26, "Portugal", "PT", "+351"),
    (27, "Russia", "RU", "+7"),
    (28, "Saudi Arabia", "SA", "+966"),
    (29, "Singapore", "SG", "+65"),
    (30, "South Africa", "ZA", "+27"),
    (31, "South Korea", "KR", "+82"),
    (32, "Spain", "ES", "+34"),
    (33, "Sweden", "SE", "+46"),
    (34, "Switzerland", "CH", "+41"),
    (35, "Thailand", "TH", "+66"),
    (36, "Turkey", "TR", "+90"),
    (37, "United Arab Emirates", "AE", "+971"),
    (38, "United Kingdom", "GB", "+44"),
    (39, "United States", "US", "+1"),
    (40, "Vietnam", "VN", "+84"),
];
