//! Pure view projections: every function maps `&App` to widgets, all
//! mutation flows back through [`Message`].

use std::fmt;

use iced::widget::{self, column, image::Handle, row, tooltip, Space};
use iced::{theme, Alignment, Color, ContentFit, Length, Theme};

use crate::app::{App, Message, Tab};
use crate::collection::{visible_inventory, CollectionStore, SortDir, SortKey, ViewTarget};
use crate::deck::DECK_SLOTS;
use crate::models::{Card, FriendStatus, RequestAction, UserSummary};

type AppElement<'a> = iced::Element<'a, Message, Theme, iced::Renderer>;

/// One entry of the deck selector dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeckChoice(usize);

impl fmt::Display for DeckChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deck {}", self.0 + 1)
    }
}

fn success_color() -> Color {
    Color::from_rgb(0.16, 0.65, 0.27)
}

fn error_color() -> Color {
    Color::from_rgb(0.86, 0.21, 0.27)
}

fn toast_banner(app: &App) -> Option<AppElement<'_>> {
    app.toast.as_ref().map(|toast| {
        let color = if toast.is_error {
            error_color()
        } else {
            success_color()
        };
        widget::container(widget::text(&toast.text).style(theme::Text::Color(color)))
            .width(Length::Fill)
            .center_x()
            .padding(8)
            .into()
    })
}

fn with_toast<'a>(app: &'a App, content: AppElement<'a>) -> AppElement<'a> {
    match toast_banner(app) {
        Some(banner) => column![banner, content].into(),
        None => content,
    }
}

// --- auth screens ---

pub fn login(app: &App) -> AppElement<'_> {
    let busy = app.auth_busy;
    let form = column![
        widget::text("Welcome Back!").size(28),
        widget::text("Please sign in to your account."),
        widget::text_input("you@example.com", &app.email)
            .on_input(Message::EmailChanged)
            .padding(8),
        widget::text_input("password", &app.password)
            .secure(true)
            .on_input(Message::PasswordChanged)
            .on_submit(Message::SubmitLogin)
            .padding(8),
        widget::button(if busy { "Signing In..." } else { "Sign In" })
            .on_press_maybe((!busy).then_some(Message::SubmitLogin)),
        widget::button("Don't have an account? Sign Up")
            .style(theme::Button::Text)
            .on_press(Message::ShowRegister),
    ]
    .spacing(12)
    .width(Length::Fixed(320.));

    let centered = widget::container(form)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x()
        .center_y();
    with_toast(app, centered.into())
}

pub fn register(app: &App) -> AppElement<'_> {
    let busy = app.auth_busy;
    let form = column![
        widget::text("Create Account").size(28),
        widget::text("Get started with your new account."),
        widget::text_input("Your Name", &app.display_name)
            .on_input(Message::DisplayNameChanged)
            .padding(8),
        widget::text_input("you@example.com", &app.email)
            .on_input(Message::EmailChanged)
            .padding(8),
        widget::text_input("Choose a strong password", &app.password)
            .secure(true)
            .on_input(Message::PasswordChanged)
            .on_submit(Message::SubmitRegister)
            .padding(8),
        widget::button(if busy {
            "Creating Account..."
        } else {
            "Create Account"
        })
        .on_press_maybe((!busy).then_some(Message::SubmitRegister)),
        widget::button("Already have an account? Sign In")
            .style(theme::Button::Text)
            .on_press(Message::ShowLogin),
    ]
    .spacing(12)
    .width(Length::Fixed(320.));

    let centered = widget::container(form)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x()
        .center_y();
    with_toast(app, centered.into())
}

// --- main screen ---

pub fn main_screen(app: &App) -> AppElement<'_> {
    let content = match app.active_tab {
        Tab::Collection => collection_tab(app),
        Tab::Store => store_tab(app),
        Tab::Friends => friends_tab(app),
    };
    row![sidebar(app), with_toast(app, content)].into()
}

fn sidebar(app: &App) -> AppElement<'_> {
    let tab_button = |label: &'static str, tab: Tab| {
        let style = if app.active_tab == tab {
            theme::Button::Primary
        } else {
            theme::Button::Secondary
        };
        widget::button(label)
            .width(Length::Fixed(140.))
            .style(style)
            .on_press(Message::ChangeTab(tab))
    };

    column![
        widget::text("CardForge").size(24),
        tab_button("Collection", Tab::Collection),
        tab_button("Store", Tab::Store),
        tab_button("Friends", Tab::Friends),
        Space::with_height(Length::Fill),
        widget::button("Log Out")
            .width(Length::Fixed(140.))
            .style(theme::Button::Destructive)
            .on_press(Message::Logout),
    ]
    .spacing(12)
    .padding(16)
    .height(Length::Fill)
    .into()
}

// --- collection + deck builder ---

fn collection_tab(app: &App) -> AppElement<'_> {
    if app.collection_loading {
        return padded_note("Loading your collection...");
    }
    if let Some(error) = &app.collection_error {
        return widget::container(
            widget::text(error).style(theme::Text::Color(error_color())),
        )
        .padding(16)
        .into();
    }
    let Some(store) = &app.collection else {
        return padded_note("Loading your collection...");
    };

    let mut content = column![collection_header(app, store)].spacing(16).padding(16);
    if store.target.is_own() {
        content = content.push(deck_controls(app, store));
        content = content.push(hotbar(app, store));
    }
    content = content.push(inventory_grid(app, store));
    content.width(Length::Fill).into()
}

fn padded_note(note: &str) -> AppElement<'_> {
    widget::container(widget::text(note)).padding(16).into()
}

fn collection_header<'a>(app: &'a App, store: &'a CollectionStore) -> AppElement<'a> {
    let title = match &store.target {
        ViewTarget::Own => "My Collection".to_owned(),
        ViewTarget::Friend { display_name, .. } => format!("{display_name}'s Collection"),
    };

    let mut header = row![].spacing(8).align_items(Alignment::Center);
    if !store.target.is_own() {
        header = header.push(widget::button("Back").on_press(Message::BackToOwnCollection));
    }
    header = header.push(widget::text(title).size(28).width(Length::Fill));
    header = header.push(
        widget::text_input("Search for cards...", &app.search_text)
            .on_input(Message::SearchChanged)
            .width(Length::Fixed(240.))
            .padding(6),
    );
    header = header.push(widget::pick_list(
        &SortKey::ALL[..],
        Some(app.sort_key),
        Message::SortKeyPicked,
    ));
    let dir_label = match app.sort_dir {
        SortDir::Asc => "asc",
        SortDir::Desc => "desc",
    };
    header = header.push(widget::button(dir_label).on_press(Message::SortDirToggled));
    header.into()
}

fn deck_controls<'a>(app: &'a App, store: &'a CollectionStore) -> AppElement<'a> {
    let editing = app.session.is_some();

    // The selector is replaced with static text while editing; only one
    // deck can be edited at a time.
    let selector: AppElement = if editing {
        widget::text(format!("Deck {}", app.active_deck + 1)).into()
    } else {
        let choices: Vec<DeckChoice> = (0..store.deck_count()).map(DeckChoice).collect();
        widget::pick_list(choices, Some(DeckChoice(app.active_deck)), |choice| {
            Message::DeckPicked(choice.0)
        })
        .into()
    };

    let edit_label = if editing { "Cancel Edit" } else { "Edit Deck" };
    let mut controls = row![
        selector,
        widget::button(edit_label)
            .on_press_maybe((store.deck_count() > 0).then_some(Message::ToggleEdit)),
    ]
    .spacing(8)
    .align_items(Alignment::Center);

    if editing {
        let save_label = if app.saving { "Saving..." } else { "Save Deck" };
        controls = controls.push(
            widget::button(save_label)
                .style(theme::Button::Positive)
                .on_press_maybe((!app.saving).then_some(Message::SaveDeck)),
        );
    }
    if app.picked_card.is_some() {
        controls = controls
            .push(widget::text("Click a hotbar slot to place the selected card.").size(13));
    }
    controls.into()
}

fn hotbar<'a>(app: &'a App, store: &'a CollectionStore) -> AppElement<'a> {
    // Project the visible slots: the live draft while editing, otherwise the
    // packed list the server last persisted for the selected deck.
    let mut slots: [Option<&str>; DECK_SLOTS] = [None; DECK_SLOTS];
    match &app.session {
        Some(session) => {
            for (cell, slot) in slots.iter_mut().zip(session.slots()) {
                *cell = slot.as_deref();
            }
        }
        None => {
            for (cell, id) in slots.iter_mut().zip(store.deck(app.active_deck)) {
                *cell = Some(id);
            }
        }
    }

    let mut bar = row![].spacing(8);
    for (index, occupant) in slots.iter().enumerate() {
        bar = bar.push(hotbar_slot(app, store, index, *occupant));
    }
    bar.into()
}

fn hotbar_slot<'a>(
    app: &'a App,
    store: &'a CollectionStore,
    index: usize,
    occupant: Option<&'a str>,
) -> AppElement<'a> {
    let editing = app.session.is_some();
    let card = occupant.and_then(|id| store.card(id));

    let face: AppElement = match card {
        Some(card) => card_image(app, &card.image, &card.name, 90),
        None => match occupant {
            Some(id) => widget::text(id).size(11).into(),
            // An empty cell shows its 1-based ordinal.
            None => widget::text((index + 1).to_string()).size(22).into(),
        },
    };

    let mut slot = widget::button(
        widget::container(face)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x()
            .center_y(),
    )
    .width(Length::Fixed(84.))
    .height(Length::Fixed(116.));
    if editing {
        slot = slot.on_press(Message::SlotClicked(index));
    }

    let slot: AppElement = match card {
        Some(card) => tooltip(
            slot,
            widget::text(format!("{} (#{})", card.name, card.number)).size(12),
            tooltip::Position::Top,
        )
        .into(),
        None => slot.into(),
    };

    let mut cell = column![slot].spacing(4).align_items(Alignment::Center);
    if editing && occupant.is_some() {
        cell = cell.push(
            widget::button(widget::text("Remove").size(11))
                .style(theme::Button::Destructive)
                .on_press(Message::RemoveFromSlot(index)),
        );
    }
    cell.into()
}

fn inventory_grid<'a>(app: &'a App, store: &'a CollectionStore) -> AppElement<'a> {
    if store.inventory.is_empty() {
        return widget::text("Your inventory is empty. Open a pack in the store to get started!")
            .into();
    }

    let cards = visible_inventory(
        store,
        &app.search_text,
        app.sort_key,
        app.sort_dir,
        app.session.as_ref(),
    );
    if cards.is_empty() {
        return widget::text("No available cards match your search.").into();
    }

    let mut grid = column![].spacing(12);
    for chunk in cards.chunks(4) {
        let mut line = row![].spacing(12);
        for card in chunk {
            line = line.push(card_cell(app, card));
        }
        grid = grid.push(line);
    }
    widget::scrollable(grid).height(Length::Fill).into()
}

fn card_cell<'a>(app: &'a App, card: &'a Card) -> AppElement<'a> {
    let editing = app.session.is_some();
    let picked = app.picked_card.as_deref() == Some(card.id.as_str());

    let mut cell = column![
        card_image(app, &card.image, &card.name, 110),
        widget::text(&card.name).size(14),
        widget::text(format!("# {}", card.number)).size(12),
        widget::text(format!("ATK {}  HP {}  {}", card.ap, card.hp, card.tier)).size(11),
    ]
    .spacing(4)
    .width(Length::Fixed(150.));

    if editing {
        let select_label = if picked { "Selected" } else { "Select" };
        cell = cell.push(
            row![
                widget::button(widget::text(select_label).size(12))
                    .on_press(Message::CardPicked(card.id.clone())),
                widget::button(widget::text("Add to deck").size(12))
                    .on_press(Message::AddToDeck(card.id.clone())),
            ]
            .spacing(6),
        );
    }
    cell.into()
}

fn card_image<'a>(app: &'a App, url: &str, name: &'a str, height: u16) -> AppElement<'a> {
    match app.image_cache.get(url) {
        Some(bytes) => widget::image::<Handle>(Handle::from_memory(bytes.clone()))
            .content_fit(ContentFit::ScaleDown)
            .height(height)
            .into(),
        None => widget::container(widget::text(name).size(12))
            .height(Length::Fixed(f32::from(height)))
            .center_y()
            .into(),
    }
}

// --- store ---

fn store_tab(app: &App) -> AppElement<'_> {
    let opening = app.opening_pack;
    let mut content = column![
        widget::text("Store").size(28),
        widget::text("Purchase and open card packs to build your collection."),
        column![
            widget::text("Standard Pack").size(20),
            widget::text("Contains 5 random cards."),
            widget::button(if opening { "Opening..." } else { "Open Pack" })
                .on_press_maybe((!opening).then_some(Message::OpenPack)),
        ]
        .spacing(8),
    ]
    .spacing(16)
    .padding(16);

    if let Some(error) = &app.pack_error {
        content = content.push(widget::text(error).style(theme::Text::Color(error_color())));
    }
    if let Some(message) = &app.pack_message {
        content = content.push(widget::text(message).size(18));
        let mut line = row![].spacing(12);
        for card in &app.pack_cards {
            line = line.push(
                column![
                    card_image(app, &card.image, &card.name, 110),
                    widget::text(&card.name).size(14),
                    widget::text(format!("# {}", card.number)).size(12),
                ]
                .spacing(4)
                .width(Length::Fixed(150.)),
            );
        }
        content = content.push(line);
    }
    content.width(Length::Fill).into()
}

// --- friends ---

fn friends_tab(app: &App) -> AppElement<'_> {
    let mut content = column![
        widget::text("Friends").size(28),
        widget::text("Add, manage, and interact with your friends."),
        add_friends_section(app),
    ]
    .spacing(16)
    .padding(16);

    if app.friends_loading {
        content = content.push(widget::text("Loading friends..."));
    } else if let Some(error) = &app.friends_error {
        content = content.push(widget::text(error).style(theme::Text::Color(error_color())));
    } else if app.friends.is_some() {
        content = content.push(my_friends_section(app));
        content = content.push(pending_section(app));
    }

    widget::scrollable(content.width(Length::Fill))
        .height(Length::Fill)
        .into()
}

fn add_friends_section(app: &App) -> AppElement<'_> {
    let busy = app.user_search_busy;
    let mut section = column![
        widget::text("Add Friends").size(20),
        row![
            widget::text_input("Enter display name to find users...", &app.user_search_text)
                .on_input(Message::UserSearchChanged)
                .on_submit(Message::SubmitUserSearch)
                .padding(6),
            widget::button(if busy { "Searching..." } else { "Search" })
                .on_press_maybe((!busy).then_some(Message::SubmitUserSearch)),
        ]
        .spacing(8),
    ]
    .spacing(8);

    if let Some(note) = &app.user_search_note {
        section = section.push(widget::text(note).size(13));
    }
    if let Some(results) = &app.user_search_results {
        for user in results {
            section = section.push(search_result_row(app, user));
        }
    }
    section.into()
}

fn search_result_row<'a>(app: &'a App, user: &'a UserSummary) -> AppElement<'a> {
    let action: AppElement = match user.status {
        Some(FriendStatus::Friend) => widget::text("Already Friends").size(13).into(),
        Some(FriendStatus::Pending) => widget::text("Request Sent").size(13).into(),
        _ if app.requests_sent.contains(&user.id) => widget::text("Sent!").size(13).into(),
        _ => {
            let sending = app.requests_in_flight.contains(&user.id);
            let label = if sending { "Sending..." } else { "Send Request" };
            widget::button(widget::text(label).size(13))
                .on_press_maybe((!sending).then(|| Message::SendFriendRequest(user.id.clone())))
                .into()
        }
    };
    row![
        widget::text(&user.display_name).width(Length::Fill),
        action,
    ]
    .spacing(8)
    .align_items(Alignment::Center)
    .into()
}

fn my_friends_section(app: &App) -> AppElement<'_> {
    let Some(data) = &app.friends else {
        return widget::text("").into();
    };

    let mut section = column![
        widget::text(format!("My Friends ({})", data.friends.len())).size(20),
        widget::text_input("Filter friends by name...", &app.friend_filter)
            .on_input(Message::FriendFilterChanged)
            .padding(6),
    ]
    .spacing(8);

    if data.friends.is_empty() {
        return section
            .push(widget::text(
                "You have no friends yet. Use the search above to add some!",
            ))
            .into();
    }

    let filter = app.friend_filter.to_lowercase();
    let visible: Vec<&UserSummary> = data
        .friends
        .iter()
        .filter(|f| f.display_name.to_lowercase().contains(&filter))
        .collect();
    if visible.is_empty() {
        section = section.push(widget::text("No friends found matching your filter."));
    }
    for friend in visible {
        section = section.push(friend_row(app, friend));
    }
    section.into()
}

fn friend_row<'a>(app: &'a App, user: &'a UserSummary) -> AppElement<'a> {
    let busy = app.friend_action_busy;
    row![
        widget::text(&user.display_name).width(Length::Fill),
        widget::button(widget::text("View collection").size(13)).on_press(
            Message::ViewFriendCollection {
                id: user.id.clone(),
                display_name: user.display_name.clone(),
            }
        ),
        widget::button(widget::text("Remove").size(13))
            .style(theme::Button::Destructive)
            .on_press_maybe((!busy).then(|| Message::RemoveFriend(user.id.clone()))),
    ]
    .spacing(8)
    .align_items(Alignment::Center)
    .into()
}

fn pending_section(app: &App) -> AppElement<'_> {
    let Some(data) = &app.friends else {
        return widget::text("").into();
    };

    let mut section = column![widget::text("Pending Requests").size(20)].spacing(8);
    if data.incoming_requests.is_empty() && data.outgoing_requests.is_empty() {
        return section.push(widget::text("No pending requests.")).into();
    }

    let busy = app.friend_action_busy;
    for user in &data.incoming_requests {
        section = section.push(
            row![
                widget::text(&user.display_name).width(Length::Fill),
                widget::text("incoming").size(12),
                widget::button(widget::text("Accept").size(13))
                    .style(theme::Button::Positive)
                    .on_press_maybe((!busy).then(|| Message::RespondToRequest(
                        user.id.clone(),
                        RequestAction::Accept
                    ))),
                widget::button(widget::text("Decline").size(13))
                    .style(theme::Button::Destructive)
                    .on_press_maybe((!busy).then(|| Message::RespondToRequest(
                        user.id.clone(),
                        RequestAction::Decline
                    ))),
            ]
            .spacing(8)
            .align_items(Alignment::Center),
        );
    }
    for user in &data.outgoing_requests {
        section = section.push(
            row![
                widget::text(&user.display_name).width(Length::Fill),
                widget::text("outgoing").size(12),
                widget::button(widget::text("Cancel").size(13))
                    .style(theme::Button::Destructive)
                    .on_press_maybe((!busy).then(|| Message::RespondToRequest(
                        user.id.clone(),
                        RequestAction::Cancel
                    ))),
            ]
            .spacing(8)
            .align_items(Alignment::Center),
        );
    }
    section.into()
}
