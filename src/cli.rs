use std::collections::BTreeSet;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    error::AppResult,
    models::{AvailableIngredients, DishId, MealTime, RecommendationQuality, RecommendationSource, UserId},
    services::RecommendationService,
};

/// Ingredients listed per row by the picker
const PICKER_COLUMNS: usize = 6;

enum MenuChoice {
    Recommend,
    Recent,
    Exit,
}

/// Line-oriented terminal session over any async reader/writer pair
///
/// Every prompt that hits end of input ends the session with `Ok(())`.
pub struct Shell<'s, R, W> {
    service: &'s RecommendationService,
    input: R,
    output: W,
}

impl<'s, R, W> Shell<'s, R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(service: &'s RecommendationService, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    pub async fn run(mut self) -> AppResult<()> {
        let Some(user) = self.sign_in().await? else {
            return Ok(());
        };

        let name = self
            .service
            .user_name(user)
            .await
            .unwrap_or_else(|| user.to_string());
        self.say(&format!("Welcome, {}!", name)).await?;

        let Some(available) = self.pick_ingredients().await? else {
            return Ok(());
        };

        loop {
            self.write("\n1. Get recommendations\n2. Recent selections\n99. Exit\n> ")
                .await?;
            let Some(line) = self.read_line().await? else {
                return Ok(());
            };

            let choice = match line.as_str() {
                "1" => MenuChoice::Recommend,
                "2" => MenuChoice::Recent,
                "99" => MenuChoice::Exit,
                _ => {
                    self.say("Unknown option.").await?;
                    continue;
                }
            };

            match choice {
                MenuChoice::Recommend => {
                    if !self.recommend(user, &available).await? {
                        return Ok(());
                    }
                }
                MenuChoice::Recent => self.show_recent(user).await?,
                MenuChoice::Exit => {
                    self.say("Goodbye!").await?;
                    return Ok(());
                }
            }
        }
    }

    /// Asks for a user id until a known one is entered, creating accounts
    /// for unknown ids along the way
    async fn sign_in(&mut self) -> AppResult<Option<UserId>> {
        loop {
            self.write("Enter your user id: ").await?;
            let Some(line) = self.read_line().await? else {
                return Ok(None);
            };
            let Ok(id) = line.parse::<i64>() else {
                self.say("Please enter a numeric user id.").await?;
                continue;
            };

            let user = UserId(id);
            if self.service.validate_user(user).await {
                return Ok(Some(user));
            }

            self.say(&format!("No account found for user {}.", user)).await?;
            let Some(name) = self.ask_username().await? else {
                return Ok(None);
            };

            match self.service.create_user(user, &name).await {
                Ok(_) => {
                    self.say(&format!("Account created for {}. Please sign in.", name))
                        .await?
                }
                Err(e) => self.say(&format!("Could not create the account: {}", e)).await?,
            }
        }
    }

    /// Re-prompts until a non-blank name is entered
    async fn ask_username(&mut self) -> AppResult<Option<String>> {
        loop {
            self.write("Choose a username: ").await?;
            let Some(name) = self.read_line().await? else {
                return Ok(None);
            };
            if !name.is_empty() {
                return Ok(Some(name));
            }
            self.say("The username must not be empty.").await?;
        }
    }

    async fn pick_ingredients(&mut self) -> AppResult<Option<AvailableIngredients>> {
        let ingredients = self.service.ingredients().await;

        let mut listing = String::from("Available ingredients:\n");
        for (row, chunk) in ingredients.chunks(PICKER_COLUMNS).enumerate() {
            for (column, ingredient) in chunk.iter().enumerate() {
                let number = row * PICKER_COLUMNS + column + 1;
                listing.push_str(&format!("{:>3}. {:<16}", number, ingredient));
            }
            listing.push('\n');
        }
        self.write(&listing).await?;

        loop {
            self.write("Enter the numbers of the ingredients you have, comma separated: ")
                .await?;
            let Some(line) = self.read_line().await? else {
                return Ok(None);
            };

            match parse_selection(&line, ingredients.len()) {
                Some(numbers) => {
                    return Ok(Some(
                        numbers
                            .into_iter()
                            .map(|number| ingredients[number - 1].clone())
                            .collect(),
                    ))
                }
                None => {
                    self.say(&format!(
                        "Please enter numbers between 1 and {}.",
                        ingredients.len()
                    ))
                    .await?
                }
            }
        }
    }

    /// Returns `false` when input ended mid-flow
    async fn recommend(&mut self, user: UserId, available: &AvailableIngredients) -> AppResult<bool> {
        self.write("Meal time? 1. Breakfast 2. Lunch 3. Dinner 4. Snacks\n> ")
            .await?;
        let Some(line) = self.read_line().await? else {
            return Ok(false);
        };
        let meal_time = line
            .parse::<usize>()
            .ok()
            .and_then(MealTime::from_menu_choice)
            .unwrap_or_default();

        let recommendations = match self
            .service
            .get_recommendations(user, available, meal_time)
            .await
        {
            Ok(recommendations) => recommendations,
            Err(e) => {
                self.say(&format!("Could not get recommendations: {}", e)).await?;
                return Ok(true);
            }
        };

        if recommendations.is_empty() {
            self.say("No dishes to recommend right now.").await?;
            return Ok(true);
        }
        if recommendations.source == RecommendationSource::Fallback {
            self.say("Nothing you rated low can be cooked with these ingredients. Similar dishes:")
                .await?;
        }

        let mut listing = String::new();
        for (index, dish) in recommendations.dishes.iter().enumerate() {
            listing.push_str(&format!("{}. {}\n", index + 1, dish.name));
        }
        self.write(&listing).await?;

        let Some(quality) = self.ask_quality().await? else {
            return Ok(false);
        };
        let shown: Vec<DishId> = recommendations.dishes.iter().map(|d| d.dish_id).collect();
        if let Err(e) = self
            .service
            .rate_recommendations(user, &shown, quality)
            .await
        {
            self.say(&format!("Could not save your feedback: {}", e)).await?;
        }

        self.write("Pick a dish by number: ").await?;
        let Some(line) = self.read_line().await? else {
            return Ok(false);
        };
        let picked = line
            .parse::<usize>()
            .ok()
            .and_then(|number| number.checked_sub(1))
            .and_then(|index| recommendations.dishes.get(index));

        match picked {
            Some(dish) => match self
                .service
                .select_dish(user, dish.dish_id, Some(quality))
                .await
            {
                Ok(_) => self.say(&format!("Enjoy your {}!", dish.name)).await?,
                Err(e) => self.say(&format!("Could not save your selection: {}", e)).await?,
            },
            None => self.say("Invalid selection.").await?,
        }

        Ok(true)
    }

    async fn ask_quality(&mut self) -> AppResult<Option<RecommendationQuality>> {
        loop {
            self.write("How good are these recommendations (1-5)? ").await?;
            let Some(line) = self.read_line().await? else {
                return Ok(None);
            };
            match line.parse::<u8>().ok().map(RecommendationQuality::new) {
                Some(Ok(quality)) => return Ok(Some(quality)),
                _ => self.say("Please enter a number from 1 to 5.").await?,
            }
        }
    }

    async fn show_recent(&mut self, user: UserId) -> AppResult<()> {
        let recent = self.service.recent_selections(user).await?;
        if recent.is_empty() {
            return self.say("You have not selected any dishes yet.").await;
        }

        let mut listing = String::from("Recently selected:\n");
        for dish in recent {
            listing.push_str(&format!(
                "- {} ({})\n",
                dish.name,
                dish.selected_at.format("%Y-%m-%d %H:%M")
            ));
        }
        self.write(&listing).await
    }

    /// Next trimmed line, `None` at end of input
    async fn read_line(&mut self) -> AppResult<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    async fn write(&mut self, text: &str) -> AppResult<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn say(&mut self, text: &str) -> AppResult<()> {
        self.write(&format!("{}\n", text)).await
    }
}

/// Parses a comma separated list of 1-based numbers up to `max`.
/// A blank line selects nothing.
fn parse_selection(line: &str, max: usize) -> Option<BTreeSet<usize>> {
    if line.trim().is_empty() {
        return Some(BTreeSet::new());
    }

    line.split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .ok()
                .filter(|number| (1..=max).contains(number))
        })
        .collect()
}
