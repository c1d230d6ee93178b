//! Prompt construction for the prediction pipeline
//!
//! The prompt asks for a fixed sectioned response format; the labels
//! requested here are the ones `parse` scans for.

use cast_market::{DailyPrice, NewsArticle, SocialSnapshot};
use chrono::NaiveDate;

/// System prompt framing the model as a market analyst
pub const SYSTEM_PROMPT: &str = "\
You are FinanceGPT, a specialized stock market analysis assistant.
You synthesize historical prices, news coverage and social media sentiment
into data-driven, professional stock analysis. You always answer in the
exact sectioned format you are asked for, and your PREDICTION section
always names a specific dollar price target.";

/// The default question asked for a next-day prediction
pub fn default_user_query(symbol: &str, as_of: NaiveDate) -> String {
    format!("What will be the price of {symbol} tomorrow based on the data from {as_of}?")
}

/// Summarize historical price data for the prompt
pub fn summarize_history(prices: &[DailyPrice]) -> String {
    let (Some(first), Some(last)) = (prices.first(), prices.last()) else {
        return "No historical price data available".to_string();
    };

    let change = if first.close > 0.0 {
        (last.close - first.close) / first.close * 100.0
    } else {
        0.0
    };
    let trend = if change > 0.0 { "upward" } else { "downward" };

    format!(
        "- Latest Price: ${:.2} ({})\n- Price Change: {:.2}%\n- Overall Trend: {}\n- Time Period: {} trading days ({} to {})",
        last.close,
        last.date,
        change,
        trend,
        prices.len(),
        first.date,
        last.date,
    )
}

/// Summarize news articles for the prompt
pub fn summarize_news(articles: &[NewsArticle]) -> String {
    if articles.is_empty() {
        return "No recent news articles available".to_string();
    }

    let mut out = String::new();
    for (i, article) in articles.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}] {} ({})\n",
            i + 1,
            article.published.format("%Y-%m-%d"),
            article.title,
            article.source,
        ));
        if !article.summary.is_empty() {
            out.push_str(&format!("   {}\n", article.summary));
        }
    }
    out.trim_end().to_string()
}

/// Summarize social sentiment for the prompt
pub fn summarize_social(snapshot: &SocialSnapshot) -> String {
    if snapshot.posts.is_empty() {
        return "No social media data available".to_string();
    }

    let sentiment = &snapshot.sentiment;
    let mut out = format!(
        "Overall Sentiment:\n- Average Polarity: {:.2}\n- Average Subjectivity: {:.2}\n- Posts Analyzed: {}\n\nTop Discussions:\n",
        sentiment.avg_post_polarity, sentiment.avg_post_subjectivity, sentiment.post_count,
    );

    for post in snapshot.posts.iter().take(3) {
        out.push_str(&format!("- {} (Score: {})\n", post.title, post.score));
    }
    out.trim_end().to_string()
}

/// Assemble the full prediction prompt
pub fn prediction_prompt(
    symbol: &str,
    as_of: NaiveDate,
    history_summary: &str,
    news_summary: &str,
    social_summary: &str,
    user_query: &str,
) -> String {
    format!(
        r#"Data is current as of {as_of}.

TASK: Analyze the provided data for {symbol} and answer the following user query: "{user_query}"

I'll provide you with three key sources of information:
1. Historical stock data (prices, volumes, trends)
2. Recent news articles relevant to {symbol}
3. Social media sentiment analysis from Reddit discussions

===== HISTORICAL DATA =====
{history_summary}

===== RECENT NEWS =====
{news_summary}

===== SOCIAL MEDIA SENTIMENT =====
{social_summary}

===== ANALYSIS INSTRUCTIONS =====
1. Analyze the historical price data first - identify key trends, patterns, and anomalies
2. Cross-reference price movements with news events - look for correlations
3. Consider social media sentiment as a measure of market psychology
4. Synthesize all three data sources to form a cohesive analysis
5. Address the user's specific query directly

===== REQUIRED RESPONSE FORMAT =====
Respond with the following sections:
1. SUMMARY: A 2-3 sentence overall assessment
2. PRICE ANALYSIS: Key insights from the price data (with specific numbers)
3. NEWS IMPACT: How recent news might affect the stock
4. SENTIMENT ANALYSIS: What the social media sentiment indicates
5. PREDICTION: Direct answer to the user's query "{user_query}", including a specific dollar price target
6. CONFIDENCE LEVEL: Your confidence in this prediction (Low/Medium/High) with explanation
7. RISK FACTORS: At least 2 events or factors that could invalidate your prediction

Keep your analysis professional, nuanced and data-driven. Avoid generic advice and be specific to {symbol}."#
    )
}
