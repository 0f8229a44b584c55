use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions},
    Client, Database as MongoDatabase, IndexModel,
};
use tracing::info;

pub const USERS: &str = "users";
pub const BOOKS: &str = "books";
pub const REVIEWS: &str = "reviews";

/// Database connection wrapper for MongoDB
///
/// Holds the client and the application database. Stores are built from it
/// once at startup and handed to the services.
#[derive(Clone)]
pub struct Database {
    /// MongoDB client instance for connection management
    pub client: Client,
    /// Specific database instance for this application
    pub database: MongoDatabase,
}

impl Database {
    /// Connect to MongoDB and verify the connection with a `ping`.
    ///
    /// # Example
    /// ```no_run
    /// # async fn run() -> Result<(), mongodb::error::Error> {
    /// let db = library_server::services::database::Database::new("mongodb://localhost:27017", "library_management").await?;
    /// # Ok(()) }
    /// ```
    pub async fn new(database_url: &str, db_name: &str) -> Result<Self, mongodb::error::Error> {
        info!("Connecting to MongoDB: {}", database_url);

        let mut client_options = ClientOptions::parse(database_url).await?;
        client_options.app_name = Some("library-server".to_string());

        let client = Client::with_options(client_options)?;
        let database = client.database(db_name);

        database.run_command(doc! { "ping": 1 }, None).await?;

        info!("MongoDB connection established successfully");

        Ok(Self { client, database })
    }

    /// Unique constraints the services rely on: one account per email and
    /// one review per (user, book).
    pub async fn ensure_indexes(&self) -> Result<(), mongodb::error::Error> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.database
            .collection::<mongodb::bson::Document>(USERS)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;

        self.database
            .collection::<mongodb::bson::Document>(REVIEWS)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user": 1, "book": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;

        self.database
            .collection::<mongodb::bson::Document>(BOOKS)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "published": 1, "available": 1, "publishedAt": -1 })
                    .build(),
                None,
            )
            .await?;

        info!("MongoDB indexes ensured");
        Ok(())
    }
}
