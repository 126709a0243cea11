use google_id_token_verifier::IdTokenVerifier;
use google_id_token_verifier::VerifierConfig;
use google_id_token_verifier::VerifyIdToken;
use std::time::Duration;

const CLIENT_ID: &str = "544304187596-0lha4fel3f687k3u7j17ro0uoc1th0m6.apps.googleusercontent.com";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example ID token (this is just a placeholder - use a real token in practice)
    let token = "eyJhbGciOiJSUzI1NiIsImtpZCI6IjYzYjRiNzRlMDQ5OGI5MjI2NTUxOGExNjc4MWFmZGI4ZDRlZjE1ZTMifQ...";

    // Example 1: Simple usage with lazy key loading
    println!("=== Example 1: Simple Usage ===");
    let verifier = IdTokenVerifier::google().await?;

    match verifier.decode(token, &[CLIENT_ID]).await {
        Ok(claims) => {
            println!("✓ Token verified successfully!");
            println!("  Subject: {}", claims.sub);
            println!("  Email: {:?}", claims.email);
        }
        Err(e) => {
            eprintln!("✗ Token verification failed: {}", e);
        }
    }

    println!();

    // Example 2: Keys kept warm by a background task
    println!("=== Example 2: Periodic Refresh ===");
    let config = VerifierConfig::new()
        .with_refresh_interval(Duration::from_secs(3600))
        .with_refresh_error_handler(|e| eprintln!("background refresh failed: {e}"));

    let verifier = IdTokenVerifier::new(config).await?;

    match verifier.verify(token, &[CLIENT_ID]).await {
        Ok(()) => println!("✓ Token verified successfully!"),
        Err(e) => eprintln!("✗ Token verification failed: {}", e),
    }

    println!();

    // Example 3: Manual refresh with custom HTTP client and multiple audiences
    println!("=== Example 3: Manual Refresh ===");
    let custom_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let config = VerifierConfig::new()
        .with_lazy_loading(false)
        .with_http_client(custom_client);

    let verifier = IdTokenVerifier::new(config).await?;
    verifier.force_refresh_certs().await?;
    println!("  Cached keys: {:?}", verifier.key_store().key_ids().await);

    match verifier.decode(token, &[CLIENT_ID, "another-client-id"]).await {
        Ok(claims) => println!("✓ Token issued for {:?}", claims.aud),
        Err(e) => eprintln!("✗ Token verification failed: {}", e),
    }

    Ok(())
}
